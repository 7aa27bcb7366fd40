//! Ordinary least-squares trend fitting per entity metric, with the calendar
//! year as the independent variable, plus extrapolation over a configured
//! horizon. Below the minimum-years floor the engine refuses to extrapolate.

use report_core::{FittedTrend, ProjectedPoint, Projection, TrendLabel};

#[derive(Debug)]
pub struct ProjectionEngine {
    horizon_years: u32,
    /// Trend-threshold fraction: slopes within +/- threshold * |mean| are
    /// flat. With a zero mean the band degenerates and any nonzero slope
    /// labels by its sign.
    trend_threshold: f64,
    min_years: usize,
}

impl ProjectionEngine {
    pub fn new(horizon_years: u32, trend_threshold: f64, min_years: usize) -> Self {
        Self {
            horizon_years,
            trend_threshold,
            min_years,
        }
    }

    /// Fits `value = intercept + slope * year` over the defined points and
    /// evaluates the line at the next `horizon_years` calendar years.
    pub fn project(&self, points: &[(i32, f64)]) -> Projection {
        if points.len() < self.min_years {
            return Projection::InsufficientData {
                observations: points.len(),
            };
        }

        let n = points.len() as f64;
        let sum_x: f64 = points.iter().map(|(year, _)| *year as f64).sum();
        let sum_y: f64 = points.iter().map(|(_, value)| value).sum();
        let sum_xy: f64 = points
            .iter()
            .map(|(year, value)| *year as f64 * value)
            .sum();
        let sum_x2: f64 = points.iter().map(|(year, _)| (*year as f64).powi(2)).sum();

        let denom = n * sum_x2 - sum_x * sum_x;
        if denom == 0.0 {
            return Projection::InsufficientData {
                observations: points.len(),
            };
        }
        let slope = (n * sum_xy - sum_x * sum_y) / denom;
        let intercept = (sum_y - slope * sum_x) / n;

        let mean = sum_y / n;
        let trend = self.label(slope, mean);

        let last_year = points.last().map(|(year, _)| *year).unwrap_or(0);
        let projected = (1..=self.horizon_years)
            .map(|offset| {
                let year = last_year + offset as i32;
                ProjectedPoint {
                    year,
                    value: intercept + slope * year as f64,
                }
            })
            .collect();

        Projection::Fitted(FittedTrend {
            slope,
            intercept,
            trend,
            observations: points.len(),
            projected,
        })
    }

    fn label(&self, slope: f64, mean: f64) -> TrendLabel {
        let threshold = self.trend_threshold * mean.abs();
        if slope > threshold {
            TrendLabel::Rising
        } else if slope < -threshold {
            TrendLabel::Falling
        } else {
            TrendLabel::Flat
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexed(values: &[f64]) -> Vec<(i32, f64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (i as i32 + 1, *v))
            .collect()
    }

    #[test]
    fn two_points_are_insufficient() {
        let engine = ProjectionEngine::new(3, 0.02, 3);
        let result = engine.project(&indexed(&[8.0, 8.5]));
        assert_eq!(result, Projection::InsufficientData { observations: 2 });
    }

    #[test]
    fn linear_series_recovers_the_true_slope() {
        let engine = ProjectionEngine::new(1, 0.02, 3);
        let Projection::Fitted(trend) = engine.project(&indexed(&[8.0, 8.5, 9.0])) else {
            panic!("expected a fitted trend");
        };
        assert!((trend.slope - 0.5).abs() < 1e-12);
        assert!((trend.intercept - 7.5).abs() < 1e-12);
        assert_eq!(trend.trend, TrendLabel::Rising);
        // Year-4 projection is the line evaluated at 4, exactly.
        assert_eq!(trend.projected, vec![ProjectedPoint { year: 4, value: 9.5 }]);
        assert_eq!(trend.projected[0].value, trend.intercept + trend.slope * 4.0);
    }

    #[test]
    fn horizon_extends_the_fitted_line() {
        let engine = ProjectionEngine::new(3, 0.02, 3);
        let points = vec![(2021, 10.0), (2022, 12.0), (2023, 14.0)];
        let Projection::Fitted(trend) = engine.project(&points) else {
            panic!("expected a fitted trend");
        };
        let years: Vec<i32> = trend.projected.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2024, 2025, 2026]);
        assert!((trend.projected[2].value - 20.0).abs() < 1e-9);
    }

    #[test]
    fn trend_label_depends_on_the_threshold_fraction() {
        let series = indexed(&[8.7, 6.0, 3.8, 6.0]);

        let tight = ProjectionEngine::new(1, 0.02, 3);
        let Projection::Fitted(trend) = tight.project(&series) else {
            panic!("expected a fitted trend");
        };
        assert_eq!(trend.trend, TrendLabel::Falling);

        let loose = ProjectionEngine::new(1, 0.25, 3);
        let Projection::Fitted(trend) = loose.project(&series) else {
            panic!("expected a fitted trend");
        };
        assert_eq!(trend.trend, TrendLabel::Flat);
    }

    #[test]
    fn zero_mean_labels_by_slope_sign() {
        let engine = ProjectionEngine::new(1, 0.5, 3);
        let Projection::Fitted(trend) = engine.project(&indexed(&[-1.0, 0.0, 1.0])) else {
            panic!("expected a fitted trend");
        };
        assert_eq!(trend.trend, TrendLabel::Rising);
    }
}
