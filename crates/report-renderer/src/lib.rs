//! Turns an [`AnalysisSet`] into the ordered list of page models that the
//! assembler serializes. The renderer formats and arranges; every number it
//! shows was computed upstream.

pub mod narrative;
mod pages;

use std::collections::BTreeSet;

use report_core::{AnalysisSet, PageModel, ReportConfig};
use tracing::info;

pub struct ReportRenderer<'a> {
    config: &'a ReportConfig,
}

impl<'a> ReportRenderer<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self { config }
    }

    /// Builds the full page set: summary, comparison, one detail page per
    /// entity in input order, then risk, projections, raw data, methodology.
    /// Entity slugs are deduplicated so tickers that slugify identically
    /// (e.g. `BNP.PA` and `BNP-PA`) keep distinct navigation anchors.
    pub fn render(&self, set: &AnalysisSet) -> Vec<PageModel> {
        let mut models = Vec::with_capacity(set.entities.len() + 6);
        models.push(pages::summary_page(set));
        models.push(pages::comparison_page(set));
        let mut entity_slugs = BTreeSet::new();
        for analysis in &set.entities {
            let mut page = pages::entity_page(analysis);
            if !entity_slugs.insert(page.slug.clone()) {
                let mut counter = 2;
                page.slug = loop {
                    let candidate = format!("{}-{counter}", page.slug);
                    if entity_slugs.insert(candidate.clone()) {
                        break candidate;
                    }
                    counter += 1;
                };
            }
            models.push(page);
        }
        models.push(pages::risk_page(set));
        models.push(pages::projections_page(set, self.config));
        models.push(pages::raw_data_page(set));
        models.push(pages::methodology_page(set, self.config));
        info!(pages = models.len(), "rendered page models");
        models
    }
}
