//! Ingestion boundary: turns a raw statement document into a validated,
//! deterministically ordered `StatementSet`. Everything that reaches the
//! metrics engine has passed field-level validation here; business-data
//! anomalies (negative income, zero equity) pass through untouched.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use report_core::{Entity, ReportError, MAX_ENTITIES, MAX_YEARS};

#[derive(Debug, Deserialize)]
struct StatementDocument {
    entities: Vec<Entity>,
}

/// The validated input contract: entities sorted by ticker, records sorted by
/// year, all fields present and finite.
#[derive(Debug, Clone)]
pub struct StatementSet {
    pub entities: Vec<Entity>,
}

impl StatementSet {
    pub fn first_year(&self) -> Option<i32> {
        self.entities.iter().filter_map(|e| e.first_year()).min()
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.entities.iter().filter_map(|e| e.latest_year()).max()
    }
}

pub struct StatementStore;

impl StatementStore {
    pub fn load_str(raw: &str) -> Result<StatementSet, ReportError> {
        let document: StatementDocument = serde_json::from_str(raw)
            .map_err(|e| ReportError::InvalidData(format!("statement document: {e}")))?;
        Self::validate(document.entities)
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<StatementSet, ReportError> {
        let raw = std::fs::read_to_string(path)?;
        Self::load_str(&raw)
    }

    fn validate(mut entities: Vec<Entity>) -> Result<StatementSet, ReportError> {
        if entities.is_empty() {
            return Err(ReportError::InvalidData(
                "statement document contains no entities".to_string(),
            ));
        }
        if entities.len() > MAX_ENTITIES {
            return Err(ReportError::InvalidData(format!(
                "{} entities exceeds the cap of {MAX_ENTITIES}",
                entities.len()
            )));
        }

        entities.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        for pair in entities.windows(2) {
            if pair[0].ticker == pair[1].ticker {
                return Err(ReportError::InvalidData(format!(
                    "duplicate ticker {}",
                    pair[0].ticker
                )));
            }
        }

        for entity in &entities {
            Self::validate_entity(entity)?;
            let gaps = entity.gap_years();
            if !gaps.is_empty() {
                warn!(ticker = %entity.ticker, ?gaps, "entity history has gap years");
            }
        }

        info!(
            entities = entities.len(),
            years = entities.iter().map(|e| e.records.len()).sum::<usize>(),
            "statement set validated"
        );
        Ok(StatementSet { entities })
    }

    fn validate_entity(entity: &Entity) -> Result<(), ReportError> {
        if entity.ticker.trim().is_empty() || entity.name.trim().is_empty() {
            return Err(ReportError::InvalidData(
                "entity ticker and name must be non-empty".to_string(),
            ));
        }
        if entity.records.is_empty() {
            return Err(ReportError::InvalidData(format!(
                "{}: no fiscal year records",
                entity.ticker
            )));
        }
        if entity.records.len() > MAX_YEARS {
            return Err(ReportError::InvalidData(format!(
                "{}: {} records exceeds the cap of {MAX_YEARS}",
                entity.ticker,
                entity.records.len()
            )));
        }

        for record in &entity.records {
            let fields = [
                ("revenue", record.revenue),
                ("net_income", record.net_income),
                ("total_assets", record.total_assets),
                ("total_liabilities", record.total_liabilities),
                ("total_equity", record.total_equity),
            ];
            for (name, value) in fields {
                if !value.is_finite() {
                    return Err(ReportError::InvalidData(format!(
                        "{} year {}: {name} is not a finite number",
                        entity.ticker, record.year
                    )));
                }
            }
        }

        for pair in entity.records.windows(2) {
            if pair[1].year == pair[0].year {
                return Err(ReportError::InvalidData(format!(
                    "{}: duplicate year {}",
                    entity.ticker, pair[0].year
                )));
            }
            if pair[1].year < pair[0].year {
                return Err(ReportError::InvalidData(format!(
                    "{}: records out of order at year {}",
                    entity.ticker, pair[1].year
                )));
            }
        }
        Ok(())
    }
}
