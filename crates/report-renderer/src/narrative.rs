//! Table-driven narrative classifier: maps already-computed metric values to
//! canned statement identifiers. A pure function from values to keys, so the
//! wording of every entity page is auditable in one place.

use report_core::{Metric, NarrativeItem, NarrativeTone};

/// Margin (%) at or above which profitability reads as solid.
pub const MARGIN_SOLID: f64 = 15.0;
/// Leverage below which the capital structure reads as robust.
pub const LEVERAGE_CONTAINED: f64 = 12.0;
/// Coefficient-of-variation bands for stability wording.
pub const CV_STABLE: f64 = 0.20;
pub const CV_VOLATILE: f64 = 0.40;

/// Everything the classifier is allowed to look at. All values are computed
/// upstream; the classifier only bands them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NarrativeContext {
    pub latest_roe: Option<f64>,
    pub mean_roe: Option<f64>,
    pub roe_change_pct: Option<f64>,
    pub latest_margin: Option<f64>,
    pub latest_leverage: Option<f64>,
    pub roe_cv: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKey {
    RoeAboveHistoricalMean,
    RoeBelowHistoricalMean,
    RoeImproved,
    RoeDeclined,
    MarginSolid,
    MarginWeak,
    LeverageContained,
    LeverageElevated,
    StableProfile,
    VolatileProfile,
    RecommendImproveEfficiency,
    RecommendStrengthenCapital,
    RecommendInvestigateDecline,
    RecommendStayCourse,
}

impl StatementKey {
    pub fn tone(&self) -> NarrativeTone {
        use StatementKey::*;
        match self {
            RoeAboveHistoricalMean | RoeImproved | MarginSolid | LeverageContained
            | StableProfile => NarrativeTone::Strength,
            RoeBelowHistoricalMean | RoeDeclined | MarginWeak | LeverageElevated
            | VolatileProfile => NarrativeTone::Weakness,
            RecommendImproveEfficiency
            | RecommendStrengthenCapital
            | RecommendInvestigateDecline
            | RecommendStayCourse => NarrativeTone::Recommendation,
        }
    }

    pub fn render(&self, ctx: &NarrativeContext) -> String {
        use StatementKey::*;
        match self {
            RoeAboveHistoricalMean => format!(
                "ROE above its historical mean ({} vs {})",
                Metric::Roe.format_opt(ctx.latest_roe),
                Metric::Roe.format_opt(ctx.mean_roe)
            ),
            RoeBelowHistoricalMean => format!(
                "ROE below its historical mean ({} vs {})",
                Metric::Roe.format_opt(ctx.latest_roe),
                Metric::Roe.format_opt(ctx.mean_roe)
            ),
            RoeImproved => format!(
                "ROE improved by {:.1}% over the period",
                ctx.roe_change_pct.unwrap_or(0.0).abs()
            ),
            RoeDeclined => format!(
                "ROE declined by {:.1}% over the period",
                ctx.roe_change_pct.unwrap_or(0.0).abs()
            ),
            MarginSolid => format!(
                "Solid profit margin of {}",
                Metric::Margin.format_opt(ctx.latest_margin)
            ),
            MarginWeak => format!(
                "Profit margin has room to improve ({})",
                Metric::Margin.format_opt(ctx.latest_margin)
            ),
            LeverageContained => format!(
                "Robust capital structure (leverage of {})",
                Metric::Leverage.format_opt(ctx.latest_leverage)
            ),
            LeverageElevated => format!(
                "Elevated debt level (leverage of {})",
                Metric::Leverage.format_opt(ctx.latest_leverage)
            ),
            StableProfile => format!(
                "Consistent profitability (ROE coefficient of variation {:.2})",
                ctx.roe_cv.unwrap_or(0.0)
            ),
            VolatileProfile => format!(
                "Volatile profitability (ROE coefficient of variation {:.2})",
                ctx.roe_cv.unwrap_or(0.0)
            ),
            RecommendImproveEfficiency => {
                "Improve operating efficiency to lift margins".to_string()
            }
            RecommendStrengthenCapital => {
                "Strengthen the equity base to reduce financial risk".to_string()
            }
            RecommendInvestigateDecline => {
                "Investigate the drivers behind the profitability decline".to_string()
            }
            RecommendStayCourse => "Maintain the current trajectory".to_string(),
        }
    }
}

/// Bands the context into statement keys. Statements whose inputs are
/// undefined are simply absent, never guessed.
pub fn classify(ctx: &NarrativeContext) -> Vec<StatementKey> {
    use StatementKey::*;
    let mut keys = Vec::new();

    if let (Some(latest), Some(mean)) = (ctx.latest_roe, ctx.mean_roe) {
        keys.push(if latest > mean {
            RoeAboveHistoricalMean
        } else {
            RoeBelowHistoricalMean
        });
    }
    if let Some(change) = ctx.roe_change_pct {
        keys.push(if change > 0.0 { RoeImproved } else { RoeDeclined });
    }
    if let Some(margin) = ctx.latest_margin {
        keys.push(if margin > MARGIN_SOLID { MarginSolid } else { MarginWeak });
    }
    if let Some(leverage) = ctx.latest_leverage {
        keys.push(if leverage < LEVERAGE_CONTAINED {
            LeverageContained
        } else {
            LeverageElevated
        });
    }
    if let Some(cv) = ctx.roe_cv {
        if cv.abs() < CV_STABLE {
            keys.push(StableProfile);
        } else if cv.abs() > CV_VOLATILE {
            keys.push(VolatileProfile);
        }
    }

    let mut recommendations = Vec::new();
    if ctx.latest_margin.is_some_and(|m| m <= MARGIN_SOLID) {
        recommendations.push(RecommendImproveEfficiency);
    }
    if ctx.latest_leverage.is_some_and(|l| l >= LEVERAGE_CONTAINED) {
        recommendations.push(RecommendStrengthenCapital);
    }
    if ctx.roe_change_pct.is_some_and(|c| c < 0.0) {
        recommendations.push(RecommendInvestigateDecline);
    }
    if recommendations.is_empty() {
        recommendations.push(RecommendStayCourse);
    }
    keys.extend(recommendations);
    keys
}

/// Classifies and renders in one pass, as the entity pages consume it.
pub fn items(ctx: &NarrativeContext) -> Vec<NarrativeItem> {
    classify(ctx)
        .into_iter()
        .map(|key| NarrativeItem {
            tone: key.tone(),
            text: key.render(ctx),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy() -> NarrativeContext {
        NarrativeContext {
            latest_roe: Some(0.095),
            mean_roe: Some(0.081),
            roe_change_pct: Some(12.0),
            latest_margin: Some(21.0),
            latest_leverage: Some(10.5),
            roe_cv: Some(0.12),
        }
    }

    #[test]
    fn healthy_entity_gets_stay_course() {
        let keys = classify(&healthy());
        assert!(keys.contains(&StatementKey::RoeAboveHistoricalMean));
        assert!(keys.contains(&StatementKey::MarginSolid));
        assert!(keys.contains(&StatementKey::LeverageContained));
        assert!(keys.contains(&StatementKey::StableProfile));
        assert!(keys.contains(&StatementKey::RecommendStayCourse));
        assert!(!keys.contains(&StatementKey::RecommendStrengthenCapital));
    }

    #[test]
    fn weak_margin_and_high_leverage_drive_recommendations() {
        let ctx = NarrativeContext {
            latest_margin: Some(9.0),
            latest_leverage: Some(16.0),
            roe_change_pct: Some(-8.0),
            ..Default::default()
        };
        let keys = classify(&ctx);
        assert!(keys.contains(&StatementKey::MarginWeak));
        assert!(keys.contains(&StatementKey::LeverageElevated));
        assert!(keys.contains(&StatementKey::RecommendImproveEfficiency));
        assert!(keys.contains(&StatementKey::RecommendStrengthenCapital));
        assert!(keys.contains(&StatementKey::RecommendInvestigateDecline));
        assert!(!keys.contains(&StatementKey::RecommendStayCourse));
    }

    #[test]
    fn undefined_inputs_produce_no_statement() {
        let keys = classify(&NarrativeContext::default());
        // Nothing to band, so only the fallback recommendation remains.
        assert_eq!(keys, vec![StatementKey::RecommendStayCourse]);
    }

    #[test]
    fn band_edges_are_exclusive_for_the_good_side() {
        let ctx = NarrativeContext {
            latest_margin: Some(MARGIN_SOLID),
            latest_leverage: Some(LEVERAGE_CONTAINED),
            ..Default::default()
        };
        let keys = classify(&ctx);
        assert!(keys.contains(&StatementKey::MarginWeak));
        assert!(keys.contains(&StatementKey::LeverageElevated));
    }

    #[test]
    fn mid_band_cv_stays_silent_on_stability() {
        let ctx = NarrativeContext { roe_cv: Some(0.30), ..Default::default() };
        let keys = classify(&ctx);
        assert!(!keys.contains(&StatementKey::StableProfile));
        assert!(!keys.contains(&StatementKey::VolatileProfile));
    }

    #[test]
    fn rendered_items_carry_tones() {
        let rendered = items(&healthy());
        assert!(rendered
            .iter()
            .any(|i| i.tone == report_core::NarrativeTone::Strength));
        assert!(rendered
            .iter()
            .any(|i| i.tone == report_core::NarrativeTone::Recommendation));
    }
}
