//! Derives per-year financial ratios and year-over-year growth from validated
//! statement records. Pure functions of the input; a non-positive denominator
//! yields `None` for that metric only.

use report_core::{DerivedMetricSet, Entity, FiscalYearRecord, GrowthSet};

#[derive(Debug, Default)]
pub struct MetricsEngine;

impl MetricsEngine {
    pub fn new() -> Self {
        Self
    }

    fn ratio(&self, numerator: f64, denominator: f64) -> Option<f64> {
        if denominator > 0.0 {
            Some(numerator / denominator)
        } else {
            None
        }
    }

    /// ROE = NI / Equity, ROA = NI / Assets, Margin = NI / Revenue (%),
    /// Leverage = Liabilities / Equity, EquityRatio = Equity / Assets (%).
    pub fn derive(&self, record: &FiscalYearRecord) -> DerivedMetricSet {
        DerivedMetricSet {
            year: record.year,
            roe: self.ratio(record.net_income, record.total_equity),
            roa: self.ratio(record.net_income, record.total_assets),
            margin: self
                .ratio(record.net_income, record.revenue)
                .map(|m| m * 100.0),
            leverage: self.ratio(record.total_liabilities, record.total_equity),
            equity_ratio: self
                .ratio(record.total_equity, record.total_assets)
                .map(|e| e * 100.0),
        }
    }

    pub fn derive_series(&self, entity: &Entity) -> Vec<DerivedMetricSet> {
        entity.records.iter().map(|r| self.derive(r)).collect()
    }

    fn pct_change(&self, current: f64, previous: f64) -> Option<f64> {
        if previous != 0.0 {
            Some(((current - previous) / previous) * 100.0)
        } else {
            None
        }
    }

    /// Year-over-year growth of revenue, net income and assets. The first
    /// year and any year following a gap carry no growth.
    pub fn growth_series(&self, entity: &Entity) -> Vec<GrowthSet> {
        let mut growth = Vec::with_capacity(entity.records.len());
        for (index, record) in entity.records.iter().enumerate() {
            let previous = index
                .checked_sub(1)
                .map(|i| &entity.records[i])
                .filter(|p| p.year == record.year - 1);
            let set = match previous {
                Some(prev) => GrowthSet {
                    year: record.year,
                    revenue_growth: self.pct_change(record.revenue, prev.revenue),
                    net_income_growth: self.pct_change(record.net_income, prev.net_income),
                    assets_growth: self.pct_change(record.total_assets, prev.total_assets),
                },
                None => GrowthSet {
                    year: record.year,
                    revenue_growth: None,
                    net_income_growth: None,
                    assets_growth: None,
                },
            };
            growth.push(set);
        }
        growth
    }
}
