//! End-to-end orchestration: validated statements in, page models (or the
//! written HTML artifact) out. Per-entity stages run in parallel; the
//! composite stage is the barrier that needs every entity's metrics at once.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use benchmark_comparator::BenchmarkComparator;
use composite_scorer::{CompositeInput, CompositeScorer};
use metrics_engine::MetricsEngine;
use page_assembler::{ArtifactMeta, PageAssembler};
use projection_engine::ProjectionEngine;
use report_core::{
    AnalysisSet, Entity, EntityAnalysis, GapPolicy, Metric, PageModel, ReportConfig, ReportError,
};
use report_renderer::ReportRenderer;
use statement_store::StatementSet;
use volatility_scorer::VolatilityScorer;

pub struct ReportPipeline {
    config: ReportConfig,
    metrics: MetricsEngine,
    volatility: VolatilityScorer,
    comparator: BenchmarkComparator,
    projector: ProjectionEngine,
}

impl ReportPipeline {
    /// Validates the configuration up front; a bad config never produces a
    /// partial report.
    pub fn new(config: ReportConfig) -> Result<Self, ReportError> {
        config.validate()?;
        let volatility = VolatilityScorer::new(config.min_years_volatility);
        let comparator = BenchmarkComparator::new(config.benchmark_basis);
        let projector = ProjectionEngine::new(
            config.projection_horizon_years,
            config.trend_threshold,
            config.min_years_projection,
        );
        Ok(Self {
            config,
            metrics: MetricsEngine::new(),
            volatility,
            comparator,
            projector,
        })
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Runs every analytical stage over an already validated statement set.
    pub fn analyze(&self, statements: &StatementSet) -> Result<AnalysisSet, ReportError> {
        let first_year = statements.first_year().ok_or_else(|| {
            ReportError::InsufficientData("statement set has no records".to_string())
        })?;
        let latest_year = statements.latest_year().ok_or_else(|| {
            ReportError::InsufficientData("statement set has no records".to_string())
        })?;

        let mut entities: Vec<EntityAnalysis> = statements
            .entities
            .par_iter()
            .map(|entity| self.analyze_entity(entity))
            .collect::<Result<Vec<_>, _>>()?;

        let comparative_count = entities.iter().filter(|e| e.comparative).count();
        if comparative_count == 0 {
            // Below-minimum-years is never fatal. The report degrades to
            // flagged entity and raw-data pages with empty comparative
            // sections.
            warn!("no entity passed the comparative gate");
        }

        // Barrier: composite scoring and radar normalization see all
        // comparative entities at once.
        let inputs: Vec<CompositeInput> = entities
            .iter()
            .filter(|e| e.comparative)
            .map(|e| CompositeInput {
                ticker: e.entity.ticker.clone(),
                values: Metric::ALL
                    .iter()
                    .map(|m| (*m, e.latest_metrics().and_then(|set| set.get(*m))))
                    .collect(),
            })
            .collect();
        let normalized_latest = CompositeScorer::normalized_values(&inputs);
        let scorer = CompositeScorer::from_config(&self.config);
        let mut ranking = scorer.score(&inputs);
        scorer.rank(&mut ranking);

        for analysis in &mut entities {
            analysis.composite = ranking
                .iter()
                .find(|s| s.ticker == analysis.entity.ticker)
                .map(|s| s.score);
        }

        info!(
            entities = entities.len(),
            comparative = comparative_count,
            first_year,
            latest_year,
            "analysis complete"
        );
        Ok(AnalysisSet {
            entities,
            first_year,
            latest_year,
            ranking,
            normalized_latest,
        })
    }

    fn analyze_entity(&self, entity: &Entity) -> Result<EntityAnalysis, ReportError> {
        let gap_years = entity.gap_years();
        let excluded_by_gap =
            self.config.gap_policy == GapPolicy::ExcludeEntity && !gap_years.is_empty();
        let comparative =
            entity.records.len() >= self.config.min_years_volatility && !excluded_by_gap;

        let metrics = self.metrics.derive_series(entity);
        let growth = self.metrics.growth_series(entity);

        let mut analysis = EntityAnalysis {
            entity: entity.clone(),
            comparative,
            gap_years,
            metrics,
            growth,
            volatility: BTreeMap::new(),
            benchmarks: BTreeMap::new(),
            projections: BTreeMap::new(),
            composite: None,
            roe_period_change_pct: None,
        };
        if !comparative {
            debug!(ticker = %entity.ticker, "entity excluded from comparative stages");
            return Ok(analysis);
        }

        for metric in Metric::ALL {
            let series = analysis.metric_series(metric);
            analysis
                .volatility
                .insert(metric, self.volatility.profile(metric, &series));
            let spec = BenchmarkComparator::spec_for(&self.config, metric)?;
            analysis
                .benchmarks
                .insert(metric, self.comparator.assess(metric, &series, spec));
            let points = analysis.metric_points(metric);
            analysis
                .projections
                .insert(metric, self.projector.project(&points));
        }

        let roe_points = analysis.metric_points(Metric::Roe);
        analysis.roe_period_change_pct = match (roe_points.first(), roe_points.last()) {
            (Some((_, first)), Some((_, last))) if roe_points.len() >= 2 && *first != 0.0 => {
                Some((last - first) / first * 100.0)
            }
            _ => None,
        };
        Ok(analysis)
    }

    /// Renders the page set for an analysis.
    pub fn render(&self, set: &AnalysisSet) -> Vec<PageModel> {
        ReportRenderer::new(&self.config).render(set)
    }

    /// The whole run: analyze, render, assemble, write.
    pub fn run(
        &self,
        statements: &StatementSet,
        report_title: &str,
        output: impl AsRef<Path>,
        generated_at: DateTime<Utc>,
    ) -> Result<ArtifactMeta, ReportError> {
        let set = self.analyze(statements)?;
        let pages = self.render(&set);
        PageAssembler::new(report_title, generated_at).write_file(output, &pages)
    }
}
