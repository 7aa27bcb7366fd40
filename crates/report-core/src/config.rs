use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ReportError;
use crate::types::Metric;

/// Tolerance around 1.0 for the composite weight sum.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Which value of an entity's history the benchmark comparator judges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkBasis {
    /// Most recent defined value.
    Latest,
    /// Mean of all defined values.
    Average,
}

/// Sector-wide reference value for one metric plus the classification bands,
/// expressed as fractions of the reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSpec {
    pub reference: f64,
    /// Band width below the reference (and above it too, unless `upper_band`
    /// overrides it for an asymmetric band).
    pub band: f64,
    #[serde(default)]
    pub upper_band: Option<f64>,
}

impl BenchmarkSpec {
    pub fn lower_bound(&self) -> f64 {
        self.reference - self.band * self.reference.abs()
    }

    pub fn upper_bound(&self) -> f64 {
        self.reference + self.upper_band.unwrap_or(self.band) * self.reference.abs()
    }
}

/// Policy for a missing year inside an otherwise eligible history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Keep the entity with a shrunken series; growth across the gap is
    /// undefined.
    SkipYear,
    /// Drop the entity from every comparative stage.
    ExcludeEntity,
}

/// The full configuration surface, threaded explicitly through every pipeline
/// stage. There are no ambient defaults; `validate` runs before any page is
/// produced and a violation aborts the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Reference values per metric; required for every comparative metric.
    pub benchmarks: BTreeMap<Metric, BenchmarkSpec>,
    #[serde(default = "default_benchmark_basis")]
    pub benchmark_basis: BenchmarkBasis,
    /// Composite-score weights per metric; must sum to 1.0.
    pub weights: BTreeMap<Metric, f64>,
    /// Number of future periods to extrapolate.
    pub projection_horizon_years: u32,
    /// Trend-threshold fraction: a slope within +/- threshold * |mean| is
    /// labelled flat.
    pub trend_threshold: f64,
    #[serde(default = "default_min_years_volatility")]
    pub min_years_volatility: usize,
    #[serde(default = "default_min_years_projection")]
    pub min_years_projection: usize,
    #[serde(default = "default_gap_policy")]
    pub gap_policy: GapPolicy,
}

fn default_benchmark_basis() -> BenchmarkBasis {
    BenchmarkBasis::Latest
}
fn default_min_years_volatility() -> usize {
    2
}
fn default_min_years_projection() -> usize {
    3
}
fn default_gap_policy() -> GapPolicy {
    GapPolicy::SkipYear
}

impl ReportConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ReportError> {
        let config: ReportConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Fatal startup validation. Every violation here aborts report
    /// generation before any output exists.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.weights.is_empty() {
            return Err(ReportError::Configuration(
                "composite weights are empty".to_string(),
            ));
        }
        for (metric, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ReportError::Configuration(format!(
                    "weight for {} must be finite and non-negative, got {}",
                    metric.key(),
                    weight
                )));
            }
        }
        let sum: f64 = self.weights.values().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ReportError::Configuration(format!(
                "composite weights must sum to 1.0, got {sum}"
            )));
        }

        for metric in Metric::ALL {
            let Some(spec) = self.benchmarks.get(&metric) else {
                return Err(ReportError::Configuration(format!(
                    "missing benchmark reference for {}",
                    metric.key()
                )));
            };
            if !spec.reference.is_finite() {
                return Err(ReportError::Configuration(format!(
                    "benchmark reference for {} is not finite",
                    metric.key()
                )));
            }
            let upper = spec.upper_band.unwrap_or(spec.band);
            if spec.band <= 0.0 || upper <= 0.0 {
                return Err(ReportError::Configuration(format!(
                    "benchmark bands for {} must be positive",
                    metric.key()
                )));
            }
        }

        if self.projection_horizon_years == 0 {
            return Err(ReportError::Configuration(
                "projection horizon must be positive".to_string(),
            ));
        }
        if !self.trend_threshold.is_finite() || self.trend_threshold <= 0.0 {
            return Err(ReportError::Configuration(
                "trend threshold must be a positive fraction".to_string(),
            ));
        }
        if self.min_years_volatility < 2 {
            return Err(ReportError::Configuration(
                "volatility requires at least 2 years".to_string(),
            ));
        }
        if self.min_years_projection < 3 {
            return Err(ReportError::Configuration(
                "projection requires at least 3 years".to_string(),
            ));
        }
        Ok(())
    }
}
