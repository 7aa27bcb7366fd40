use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Hard cap on the number of entities accepted at ingestion.
pub const MAX_ENTITIES: usize = 16;
/// Hard cap on the number of fiscal years per entity.
pub const MAX_YEARS: usize = 50;

/// The comparative metric set derived from annual statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Roe,
    Roa,
    Margin,
    Leverage,
    EquityRatio,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Roe,
        Metric::Roa,
        Metric::Margin,
        Metric::Leverage,
        Metric::EquityRatio,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Metric::Roe => "roe",
            Metric::Roa => "roa",
            Metric::Margin => "margin",
            Metric::Leverage => "leverage",
            Metric::EquityRatio => "equity_ratio",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Roe => "ROE",
            Metric::Roa => "ROA",
            Metric::Margin => "Profit Margin",
            Metric::Leverage => "Leverage Ratio",
            Metric::EquityRatio => "Equity Ratio",
        }
    }

    /// Whether a smaller value is the better one (debt-driven structure).
    pub fn lower_is_better(&self) -> bool {
        matches!(self, Metric::Leverage)
    }

    /// Margin and equity ratio are carried as percentages, ROE/ROA as
    /// decimal fractions and leverage as a plain ratio.
    pub fn format(&self, value: f64) -> String {
        match self {
            Metric::Roe | Metric::Roa => format!("{:.3}", value),
            Metric::Margin | Metric::EquityRatio => format!("{:.2}%", value),
            Metric::Leverage => format!("{:.2}", value),
        }
    }

    pub fn format_opt(&self, value: Option<f64>) -> String {
        match value {
            Some(v) => self.format(v),
            None => "n/a".to_string(),
        }
    }
}

/// One validated fiscal year of statement line items.
/// All monetary fields share a single currency and unit convention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiscalYearRecord {
    pub year: i32,
    pub revenue: f64,
    pub net_income: f64,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub total_equity: f64,
}

/// A reporting entity with its ordered yearly records. Immutable after
/// ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub ticker: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    pub records: Vec<FiscalYearRecord>,
}

impl Entity {
    pub fn first_year(&self) -> Option<i32> {
        self.records.first().map(|r| r.year)
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.records.last().map(|r| r.year)
    }

    /// Calendar years missing between the first and last record.
    pub fn gap_years(&self) -> Vec<i32> {
        let (Some(first), Some(last)) = (self.first_year(), self.latest_year()) else {
            return Vec::new();
        };
        let present: Vec<i32> = self.records.iter().map(|r| r.year).collect();
        (first..=last).filter(|y| !present.contains(y)).collect()
    }
}

/// Ratios derived from exactly one `FiscalYearRecord`. A metric whose
/// denominator is not strictly positive is `None`, never a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetricSet {
    pub year: i32,
    pub roe: Option<f64>,
    pub roa: Option<f64>,
    pub margin: Option<f64>,
    pub leverage: Option<f64>,
    pub equity_ratio: Option<f64>,
}

impl DerivedMetricSet {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Roe => self.roe,
            Metric::Roa => self.roa,
            Metric::Margin => self.margin,
            Metric::Leverage => self.leverage,
            Metric::EquityRatio => self.equity_ratio,
        }
    }
}

/// Year-over-year growth percentages. `None` for the first year of a series
/// and across a gap year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthSet {
    pub year: i32,
    pub revenue_growth: Option<f64>,
    pub net_income_growth: Option<f64>,
    pub assets_growth: Option<f64>,
}

/// Dispersion statistics over one entity's history of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityProfile {
    pub metric: Metric,
    pub mean: f64,
    /// Corrected sample standard deviation (n - 1 denominator).
    pub std_dev: f64,
    /// Coefficient of variation; `None` when the mean is zero.
    pub cv: Option<f64>,
    pub observations: usize,
}

/// Classification tier against a sector benchmark reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkClass {
    Outperform,
    InLine,
    Underperform,
}

impl BenchmarkClass {
    pub fn label(&self) -> &'static str {
        match self {
            BenchmarkClass::Outperform => "Outperform",
            BenchmarkClass::InLine => "In line",
            BenchmarkClass::Underperform => "Underperform",
        }
    }

    /// Numeric tier, higher is better. Used for monotonicity checks and
    /// heatmap intensity.
    pub fn tier(&self) -> u8 {
        match self {
            BenchmarkClass::Outperform => 2,
            BenchmarkClass::InLine => 1,
            BenchmarkClass::Underperform => 0,
        }
    }
}

/// The value the comparator judged together with its tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkAssessment {
    pub value: f64,
    pub class: BenchmarkClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendLabel {
    Rising,
    Falling,
    Flat,
}

impl TrendLabel {
    pub fn label(&self) -> &'static str {
        match self {
            TrendLabel::Rising => "Rising",
            TrendLabel::Falling => "Falling",
            TrendLabel::Flat => "Flat",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub year: i32,
    pub value: f64,
}

/// Ordinary least-squares fit over (year, value) points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTrend {
    pub slope: f64,
    pub intercept: f64,
    pub trend: TrendLabel,
    pub observations: usize,
    pub projected: Vec<ProjectedPoint>,
}

impl FittedTrend {
    /// Evaluates the fitted line at an arbitrary calendar year.
    pub fn value_at(&self, year: i32) -> f64 {
        self.intercept + self.slope * year as f64
    }
}

/// Either a fitted trend or an explicit refusal to extrapolate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Projection {
    Fitted(FittedTrend),
    InsufficientData { observations: usize },
}

impl Projection {
    pub fn fitted(&self) -> Option<&FittedTrend> {
        match self {
            Projection::Fitted(trend) => Some(trend),
            Projection::InsufficientData { .. } => None,
        }
    }
}

/// One normalized, weighted aggregate per entity, in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub ticker: String,
    pub score: f64,
    /// Unweighted mean of raw ROE and ROA, used as the ranking tie-break.
    pub tie_break: Option<f64>,
}

/// Everything computed for one entity, as consumed by the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityAnalysis {
    pub entity: Entity,
    /// Whether the entity passed the validation gate into comparative stages.
    pub comparative: bool,
    pub gap_years: Vec<i32>,
    pub metrics: Vec<DerivedMetricSet>,
    pub growth: Vec<GrowthSet>,
    pub volatility: BTreeMap<Metric, Option<VolatilityProfile>>,
    pub benchmarks: BTreeMap<Metric, Option<BenchmarkAssessment>>,
    pub projections: BTreeMap<Metric, Projection>,
    pub composite: Option<f64>,
    /// Percentage change of ROE between the first and last defined point of
    /// the history, as the narrative classifier consumes it.
    pub roe_period_change_pct: Option<f64>,
}

impl EntityAnalysis {
    pub fn latest_metrics(&self) -> Option<&DerivedMetricSet> {
        self.metrics.last()
    }

    /// The full year-aligned series of one metric.
    pub fn metric_series(&self, metric: Metric) -> Vec<Option<f64>> {
        self.metrics.iter().map(|m| m.get(metric)).collect()
    }

    /// Only the defined (year, value) points of one metric.
    pub fn metric_points(&self, metric: Metric) -> Vec<(i32, f64)> {
        self.metrics
            .iter()
            .filter_map(|m| m.get(metric).map(|v| (m.year, v)))
            .collect()
    }
}

/// The full computed dataset handed to the renderer, ordered by ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSet {
    pub entities: Vec<EntityAnalysis>,
    pub first_year: i32,
    pub latest_year: i32,
    /// Composite scores ordered best-first.
    pub ranking: Vec<CompositeScore>,
    /// Direction-aware normalized latest-year values per ticker, as plotted
    /// on the radar chart.
    pub normalized_latest: BTreeMap<String, BTreeMap<Metric, f64>>,
}

impl AnalysisSet {
    pub fn comparative(&self) -> impl Iterator<Item = &EntityAnalysis> {
        self.entities.iter().filter(|e| e.comparative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i32) -> FiscalYearRecord {
        FiscalYearRecord {
            year,
            revenue: 100.0,
            net_income: 10.0,
            total_assets: 1000.0,
            total_liabilities: 900.0,
            total_equity: 100.0,
        }
    }

    #[test]
    fn gap_years_are_detected() {
        let entity = Entity {
            ticker: "BNP.PA".to_string(),
            name: "BNP Paribas".to_string(),
            color: None,
            records: vec![record(2020), record(2021), record(2024)],
        };
        assert_eq!(entity.gap_years(), vec![2022, 2023]);
    }

    #[test]
    fn gap_free_entity_has_no_gaps() {
        let entity = Entity {
            ticker: "GLE.PA".to_string(),
            name: "Societe Generale".to_string(),
            color: None,
            records: vec![record(2021), record(2022), record(2023)],
        };
        assert!(entity.gap_years().is_empty());
    }

    #[test]
    fn metric_serializes_as_snake_case_key() {
        let mut map = BTreeMap::new();
        map.insert(Metric::EquityRatio, 0.1);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"equity_ratio":0.1}"#);
        let back: BTreeMap<Metric, f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[&Metric::EquityRatio], 0.1);
    }

    #[test]
    fn benchmark_tier_orders_outperform_first() {
        assert!(BenchmarkClass::Outperform.tier() > BenchmarkClass::InLine.tier());
        assert!(BenchmarkClass::InLine.tier() > BenchmarkClass::Underperform.tier());
    }

    #[test]
    fn fitted_trend_evaluates_line() {
        let trend = FittedTrend {
            slope: 0.5,
            intercept: 7.5,
            trend: TrendLabel::Rising,
            observations: 3,
            projected: vec![],
        };
        assert_eq!(trend.value_at(4), 7.5 + 0.5 * 4.0);
    }
}
