//! Dispersion statistics over one entity's metric history: sample mean,
//! corrected sample standard deviation and coefficient of variation. Below
//! the minimum-years floor the whole profile is undefined, never zero.

use statrs::statistics::Statistics;

use report_core::{Metric, VolatilityProfile};

#[derive(Debug)]
pub struct VolatilityScorer {
    min_years: usize,
}

impl VolatilityScorer {
    pub fn new(min_years: usize) -> Self {
        Self { min_years }
    }

    /// Profiles the defined points of a metric series. `None` when fewer than
    /// `min_years` points are defined.
    pub fn profile(&self, metric: Metric, series: &[Option<f64>]) -> Option<VolatilityProfile> {
        let values: Vec<f64> = series.iter().copied().flatten().collect();
        if values.len() < self.min_years {
            return None;
        }

        let mean = values.as_slice().mean();
        let std_dev = values.as_slice().std_dev();
        let cv = if mean != 0.0 {
            Some(std_dev / mean)
        } else {
            None
        };

        Some(VolatilityProfile {
            metric,
            mean,
            std_dev,
            cv,
            observations: values.len(),
        })
    }
}
