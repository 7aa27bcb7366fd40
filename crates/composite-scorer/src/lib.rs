//! Cross-entity normalization and weighted aggregation into one comparative
//! score per entity. This is the synchronization barrier of the pipeline: it
//! needs every entity's metrics before it can scale anything.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::debug;

use report_core::{CompositeScore, Metric, ReportConfig};

/// One entity's contribution to the cross-entity scaling, typically its
/// latest-year metric values.
#[derive(Debug, Clone)]
pub struct CompositeInput {
    pub ticker: String,
    pub values: BTreeMap<Metric, Option<f64>>,
}

#[derive(Debug)]
pub struct CompositeScorer {
    weights: BTreeMap<Metric, f64>,
}

impl CompositeScorer {
    /// The configuration is validated before the pipeline runs, so the
    /// weights are known to sum to 1.0 here.
    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            weights: config.weights.clone(),
        }
    }

    /// Direction-aware min-max scaling of every metric across the entity
    /// set: 1.0 is the best entity on that metric, 0.0 the worst, and a
    /// degenerate span scales everyone to the neutral 0.5. Undefined values
    /// stay absent. Also feeds the radar rendering.
    pub fn normalized_values(
        inputs: &[CompositeInput],
    ) -> BTreeMap<String, BTreeMap<Metric, f64>> {
        let mut out: BTreeMap<String, BTreeMap<Metric, f64>> = BTreeMap::new();
        for metric in Metric::ALL {
            let defined: Vec<f64> = inputs
                .iter()
                .filter_map(|input| input.values.get(&metric).copied().flatten())
                .collect();
            if defined.is_empty() {
                continue;
            }
            let min = defined.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = defined.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

            for input in inputs {
                let Some(value) = input.values.get(&metric).copied().flatten() else {
                    continue;
                };
                let mut normalized = if max > min {
                    (value - min) / (max - min)
                } else {
                    0.5
                };
                if metric.lower_is_better() {
                    normalized = 1.0 - normalized;
                }
                out.entry(input.ticker.clone())
                    .or_default()
                    .insert(metric, normalized);
            }
        }
        out
    }

    /// Combines the normalized metrics with the configured weights. An
    /// undefined value drops that metric from the entity's weight mass and
    /// the rest is renormalized, keeping every score inside [0, 1]. Entities
    /// with no defined weighted metric produce no score.
    pub fn score(&self, inputs: &[CompositeInput]) -> Vec<CompositeScore> {
        let normalized = Self::normalized_values(inputs);
        let mut weighted_sum: BTreeMap<&str, f64> = BTreeMap::new();
        let mut weight_mass: BTreeMap<&str, f64> = BTreeMap::new();

        for (metric, weight) in &self.weights {
            if *weight == 0.0 {
                continue;
            }
            for input in inputs {
                let Some(value) = normalized
                    .get(&input.ticker)
                    .and_then(|m| m.get(metric).copied())
                else {
                    continue;
                };
                *weighted_sum.entry(input.ticker.as_str()).or_default() += weight * value;
                *weight_mass.entry(input.ticker.as_str()).or_default() += weight;
            }
        }

        inputs
            .iter()
            .filter_map(|input| {
                let mass = weight_mass.get(input.ticker.as_str()).copied()?;
                let sum = weighted_sum.get(input.ticker.as_str()).copied()?;
                let score = (sum / mass).clamp(0.0, 1.0);
                debug!(ticker = %input.ticker, score, mass, "composite score");
                Some(CompositeScore {
                    ticker: input.ticker.clone(),
                    score,
                    tie_break: tie_break(input),
                })
            })
            .collect()
    }

    /// Orders scores best-first. Equal scores fall back to the unweighted
    /// mean of raw ROE and ROA, then to the ticker, so the ranking is total
    /// and independent of input order.
    pub fn rank(&self, scores: &mut [CompositeScore]) {
        scores.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| compare_tie_break(b.tie_break, a.tie_break))
                .then_with(|| a.ticker.cmp(&b.ticker))
        });
    }
}

fn tie_break(input: &CompositeInput) -> Option<f64> {
    let raw: Vec<f64> = [Metric::Roe, Metric::Roa]
        .iter()
        .filter_map(|m| input.values.get(m).copied().flatten())
        .collect();
    if raw.is_empty() {
        None
    } else {
        Some(raw.iter().sum::<f64>() / raw.len() as f64)
    }
}

fn compare_tie_break(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use report_core::{BenchmarkBasis, BenchmarkSpec, GapPolicy};

    fn config_with_weights(weights: &[(Metric, f64)]) -> ReportConfig {
        let mut benchmarks = BTreeMap::new();
        for metric in Metric::ALL {
            benchmarks.insert(
                metric,
                BenchmarkSpec { reference: 1.0, band: 0.1, upper_band: None },
            );
        }
        ReportConfig {
            benchmarks,
            benchmark_basis: BenchmarkBasis::Latest,
            weights: weights.iter().copied().collect(),
            projection_horizon_years: 3,
            trend_threshold: 0.02,
            min_years_volatility: 2,
            min_years_projection: 3,
            gap_policy: GapPolicy::SkipYear,
        }
    }

    fn input(ticker: &str, values: &[(Metric, Option<f64>)]) -> CompositeInput {
        CompositeInput {
            ticker: ticker.to_string(),
            values: values.iter().cloned().collect(),
        }
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        let config = config_with_weights(&[(Metric::Roe, 0.5), (Metric::Leverage, 0.5)]);
        let scorer = CompositeScorer::from_config(&config);
        let scores = scorer.score(&[
            input("A", &[(Metric::Roe, Some(0.02)), (Metric::Leverage, Some(18.0))]),
            input("B", &[(Metric::Roe, Some(0.09)), (Metric::Leverage, Some(9.0))]),
            input("C", &[(Metric::Roe, Some(0.05)), (Metric::Leverage, Some(12.0))]),
        ]);
        assert_eq!(scores.len(), 3);
        for s in &scores {
            assert!((0.0..=1.0).contains(&s.score), "{} out of range", s.score);
        }
        // B dominates on both axes (leverage inverted), so it scores 1.0.
        let best = scores.iter().find(|s| s.ticker == "B").unwrap();
        assert!((best.score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn lower_leverage_scores_higher() {
        let config = config_with_weights(&[(Metric::Leverage, 1.0)]);
        let scorer = CompositeScorer::from_config(&config);
        let scores = scorer.score(&[
            input("HIGH", &[(Metric::Leverage, Some(15.0))]),
            input("LOW", &[(Metric::Leverage, Some(8.0))]),
        ]);
        let low = scores.iter().find(|s| s.ticker == "LOW").unwrap();
        let high = scores.iter().find(|s| s.ticker == "HIGH").unwrap();
        assert!(low.score > high.score);
    }

    #[test]
    fn degenerate_span_is_neutral() {
        let config = config_with_weights(&[(Metric::Roe, 1.0)]);
        let scorer = CompositeScorer::from_config(&config);
        let scores = scorer.score(&[
            input("A", &[(Metric::Roe, Some(0.07))]),
            input("B", &[(Metric::Roe, Some(0.07))]),
        ]);
        for s in scores {
            assert!((s.score - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn undefined_metric_renormalizes_the_rest() {
        let config = config_with_weights(&[(Metric::Roe, 0.5), (Metric::Margin, 0.5)]);
        let scorer = CompositeScorer::from_config(&config);
        let scores = scorer.score(&[
            input("A", &[(Metric::Roe, Some(0.09)), (Metric::Margin, None)]),
            input("B", &[(Metric::Roe, Some(0.03)), (Metric::Margin, Some(20.0))]),
        ]);
        // A is best on its only defined metric; renormalization keeps it at 1.0
        // instead of halving it.
        let a = scores.iter().find(|s| s.ticker == "A").unwrap();
        assert!((a.score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn entity_with_nothing_defined_gets_no_score() {
        let config = config_with_weights(&[(Metric::Roe, 1.0)]);
        let scorer = CompositeScorer::from_config(&config);
        let scores = scorer.score(&[
            input("A", &[(Metric::Roe, None)]),
            input("B", &[(Metric::Roe, Some(0.05))]),
        ]);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].ticker, "B");
    }

    #[test]
    fn normalized_values_invert_leverage() {
        let inputs = vec![
            input("A", &[(Metric::Leverage, Some(15.0)), (Metric::Roe, Some(0.02))]),
            input("B", &[(Metric::Leverage, Some(9.0)), (Metric::Roe, Some(0.08))]),
        ];
        let normalized = CompositeScorer::normalized_values(&inputs);
        assert_eq!(normalized["A"][&Metric::Leverage], 0.0);
        assert_eq!(normalized["B"][&Metric::Leverage], 1.0);
        assert_eq!(normalized["A"][&Metric::Roe], 0.0);
        assert_eq!(normalized["B"][&Metric::Roe], 1.0);
    }

    #[test]
    fn ranking_breaks_ties_with_raw_roe_roa_mean() {
        let config = config_with_weights(&[(Metric::Roe, 1.0)]);
        let scorer = CompositeScorer::from_config(&config);
        // Same ROE, so both normalize to the same score; the tie-break uses
        // the raw ROA as well.
        let mut scores = scorer.score(&[
            input("A", &[(Metric::Roe, Some(0.07)), (Metric::Roa, Some(0.002))]),
            input("B", &[(Metric::Roe, Some(0.07)), (Metric::Roa, Some(0.006))]),
        ]);
        scorer.rank(&mut scores);
        assert_eq!(scores[0].ticker, "B");

        // Reversed input order produces the same ranking.
        let mut reversed = scorer.score(&[
            input("B", &[(Metric::Roe, Some(0.07)), (Metric::Roa, Some(0.006))]),
            input("A", &[(Metric::Roe, Some(0.07)), (Metric::Roa, Some(0.002))]),
        ]);
        scorer.rank(&mut reversed);
        assert_eq!(reversed[0].ticker, "B");
    }
}
