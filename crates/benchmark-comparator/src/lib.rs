//! Classifies entity metrics against fixed sector references using
//! direction-aware threshold bands around each reference value.

use report_core::{
    BenchmarkAssessment, BenchmarkBasis, BenchmarkClass, BenchmarkSpec, Metric, ReportConfig,
    ReportError,
};

#[derive(Debug)]
pub struct BenchmarkComparator {
    basis: BenchmarkBasis,
}

impl BenchmarkComparator {
    pub fn new(basis: BenchmarkBasis) -> Self {
        Self { basis }
    }

    /// Resolves the reference for a metric. The configuration validator
    /// guarantees presence at startup; a miss here is still surfaced as the
    /// fatal configuration error it is, never skipped.
    pub fn spec_for<'a>(
        config: &'a ReportConfig,
        metric: Metric,
    ) -> Result<&'a BenchmarkSpec, ReportError> {
        config.benchmarks.get(&metric).ok_or_else(|| {
            ReportError::Configuration(format!(
                "missing benchmark reference for {}",
                metric.key()
            ))
        })
    }

    /// Picks the configured basis value out of a metric series, skipping
    /// undefined points.
    pub fn basis_value(&self, series: &[Option<f64>]) -> Option<f64> {
        let defined: Vec<f64> = series.iter().copied().flatten().collect();
        if defined.is_empty() {
            return None;
        }
        match self.basis {
            BenchmarkBasis::Latest => defined.last().copied(),
            BenchmarkBasis::Average => Some(defined.iter().sum::<f64>() / defined.len() as f64),
        }
    }

    /// Three-tier classification. For lower-is-better metrics the tiers
    /// flip: outperform means below the lower band edge.
    pub fn classify(&self, metric: Metric, value: f64, spec: &BenchmarkSpec) -> BenchmarkClass {
        let lower = spec.lower_bound();
        let upper = spec.upper_bound();
        if metric.lower_is_better() {
            if value < lower {
                BenchmarkClass::Outperform
            } else if value > upper {
                BenchmarkClass::Underperform
            } else {
                BenchmarkClass::InLine
            }
        } else if value > upper {
            BenchmarkClass::Outperform
        } else if value < lower {
            BenchmarkClass::Underperform
        } else {
            BenchmarkClass::InLine
        }
    }

    /// Full assessment of one metric series, or `None` when no point in the
    /// series is defined.
    pub fn assess(
        &self,
        metric: Metric,
        series: &[Option<f64>],
        spec: &BenchmarkSpec,
    ) -> Option<BenchmarkAssessment> {
        let value = self.basis_value(series)?;
        Some(BenchmarkAssessment {
            value,
            class: self.classify(metric, value, spec),
        })
    }
}
