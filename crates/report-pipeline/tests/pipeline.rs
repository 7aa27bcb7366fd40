//! End-to-end runs over a small three-bank dataset: deterministic output,
//! gate behavior, and known-number projections.

use chrono::{TimeZone, Utc};
use report_core::{GapPolicy, Metric, Projection, ReportConfig};
use report_pipeline::ReportPipeline;
use statement_store::{StatementSet, StatementStore};

fn record_json(year: i32, net_income_bn: f64, equity_bn: f64) -> serde_json::Value {
    serde_json::json!({
        "year": year,
        "revenue": 50.0e9,
        "net_income": net_income_bn * 1e9,
        "total_assets": 1000.0e9,
        "total_liabilities": 1000.0e9 - equity_bn * 1e9,
        "total_equity": equity_bn * 1e9,
    })
}

/// Alpha's ROE runs 0.080, 0.085, 0.090 on a fixed 100bn equity base.
fn sample_statements() -> StatementSet {
    let doc = serde_json::json!({
        "entities": [
            {
                "ticker": "GAMMA",
                "name": "Gamma Bank",
                "color": "#E60028",
                "records": [
                    record_json(2021, 4.0, 90.0),
                    record_json(2022, 5.0, 92.0),
                    record_json(2023, 4.5, 95.0),
                ],
            },
            {
                "ticker": "ALPHA",
                "name": "Alpha Bank",
                "records": [
                    record_json(2021, 8.0, 100.0),
                    record_json(2022, 8.5, 100.0),
                    record_json(2023, 9.0, 100.0),
                ],
            },
            {
                "ticker": "BETA",
                "name": "Beta Bank",
                "records": [
                    record_json(2021, 6.0, 120.0),
                    record_json(2022, 6.5, 118.0),
                    record_json(2023, 7.0, 121.0),
                ],
            },
        ],
    });
    StatementStore::load_str(&doc.to_string()).unwrap()
}

fn config_json(roe_weight: f64) -> String {
    serde_json::json!({
        "benchmarks": {
            "roe": { "reference": 0.08, "band": 0.10 },
            "roa": { "reference": 0.006, "band": 0.10 },
            "margin": { "reference": 14.0, "band": 0.10 },
            "leverage": { "reference": 10.0, "band": 0.15 },
            "equity_ratio": { "reference": 10.0, "band": 0.10 },
        },
        "weights": {
            "roe": roe_weight,
            "roa": 0.20,
            "margin": 0.20,
            "leverage": 0.15,
            "equity_ratio": 0.15,
        },
        "projection_horizon_years": 2,
        "trend_threshold": 0.02,
    })
    .to_string()
}

fn pipeline() -> ReportPipeline {
    let config = ReportConfig::from_json_str(&config_json(0.30)).unwrap();
    ReportPipeline::new(config).unwrap()
}

#[test]
fn entities_come_out_ticker_sorted() {
    let set = pipeline().analyze(&sample_statements()).unwrap();
    let tickers: Vec<&str> = set
        .entities
        .iter()
        .map(|e| e.entity.ticker.as_str())
        .collect();
    assert_eq!(tickers, ["ALPHA", "BETA", "GAMMA"]);
    assert_eq!(set.first_year, 2021);
    assert_eq!(set.latest_year, 2023);
}

#[test]
fn ranking_covers_every_comparative_entity_in_unit_interval() {
    let set = pipeline().analyze(&sample_statements()).unwrap();
    assert_eq!(set.ranking.len(), 3);
    for score in &set.ranking {
        assert!((0.0..=1.0).contains(&score.score), "score {}", score.score);
    }
    for pair in set.ranking.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn steady_roe_series_projects_on_the_fitted_line() {
    let set = pipeline().analyze(&sample_statements()).unwrap();
    let alpha = &set.entities[0];
    match alpha.projections.get(&Metric::Roe).unwrap() {
        Projection::Fitted(trend) => {
            assert!((trend.slope - 0.005).abs() < 1e-9);
            assert_eq!(trend.projected.len(), 2);
            assert_eq!(trend.projected[0].year, 2024);
            assert!((trend.projected[0].value - 0.095).abs() < 1e-9);
            assert!((trend.projected[1].value - 0.100).abs() < 1e-9);
        }
        other => panic!("expected fitted trend, got {other:?}"),
    }
}

#[test]
fn lower_leverage_normalizes_higher() {
    let set = pipeline().analyze(&sample_statements()).unwrap();
    // Beta holds the most equity against the same assets, so its leverage
    // is the lowest of the three.
    let beta = set.normalized_latest.get("BETA").unwrap();
    assert!((beta.get(&Metric::Leverage).copied().unwrap() - 1.0).abs() < 1e-12);
    let gamma = set.normalized_latest.get("GAMMA").unwrap();
    assert!((gamma.get(&Metric::Leverage).copied().unwrap() - 0.0).abs() < 1e-12);
}

#[test]
fn gap_year_policy_controls_the_comparative_gate() {
    let doc = serde_json::json!({
        "entities": [
            {
                "ticker": "ALPHA",
                "name": "Alpha Bank",
                "records": [
                    record_json(2020, 8.0, 100.0),
                    record_json(2021, 8.2, 100.0),
                    record_json(2023, 9.0, 100.0),
                ],
            },
            {
                "ticker": "BETA",
                "name": "Beta Bank",
                "records": [
                    record_json(2020, 6.0, 120.0),
                    record_json(2021, 6.5, 118.0),
                    record_json(2022, 6.8, 119.0),
                    record_json(2023, 7.0, 121.0),
                ],
            },
        ],
    });
    let statements = StatementStore::load_str(&doc.to_string()).unwrap();

    let set = pipeline().analyze(&statements).unwrap();
    let alpha = &set.entities[0];
    assert!(alpha.comparative);
    assert_eq!(alpha.gap_years, [2022]);
    // Growth across the gap stays undefined.
    let growth_2023 = alpha.growth.iter().find(|g| g.year == 2023).unwrap();
    assert_eq!(growth_2023.revenue_growth, None);

    let mut config = ReportConfig::from_json_str(&config_json(0.30)).unwrap();
    config.gap_policy = GapPolicy::ExcludeEntity;
    let set = ReportPipeline::new(config)
        .unwrap()
        .analyze(&statements)
        .unwrap();
    let alpha = &set.entities[0];
    assert!(!alpha.comparative);
    assert!(alpha.composite.is_none());
    assert!(alpha.projections.is_empty());
    assert_eq!(set.ranking.len(), 1);
}

#[test]
fn invalid_weight_sum_never_builds_a_pipeline() {
    for bad in [0.29, 0.31] {
        assert!(ReportConfig::from_json_str(&config_json(bad)).is_err());
    }
}

#[test]
fn all_entities_below_the_gate_still_produce_a_report() {
    let doc = serde_json::json!({
        "entities": [{
            "ticker": "SOLO",
            "name": "Solo Bank",
            "records": [record_json(2023, 5.0, 100.0)],
        }],
    });
    let statements = StatementStore::load_str(&doc.to_string()).unwrap();
    let pipeline = pipeline();

    let set = pipeline.analyze(&statements).unwrap();
    assert!(!set.entities[0].comparative);
    assert!(set.entities[0].composite.is_none());
    assert!(set.ranking.is_empty());
    assert!(set.normalized_latest.is_empty());

    // The artifact still gets written, with the entity flagged on its
    // detail and raw-data pages.
    let stamp = Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("solo.html");
    let meta = pipeline
        .run(&statements, "Bank Report", &path, stamp)
        .unwrap();
    assert_eq!(meta.pages, 7);
    let html = std::fs::read_to_string(&path).unwrap();
    assert!(html.contains("Excluded from comparative analytics"));
    assert!(html.contains("[excluded from comparative stages]"));
}

#[test]
fn full_run_is_byte_deterministic() {
    let statements = sample_statements();
    let stamp = Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline();

    let first = dir.path().join("a.html");
    let second = dir.path().join("b.html");
    pipeline
        .run(&statements, "Bank Report", &first, stamp)
        .unwrap();
    pipeline
        .run(&statements, "Bank Report", &second, stamp)
        .unwrap();
    assert_eq!(
        std::fs::read(&first).unwrap(),
        std::fs::read(&second).unwrap()
    );
}

#[test]
fn page_set_matches_entity_count() {
    let pipeline = pipeline();
    let set = pipeline.analyze(&sample_statements()).unwrap();
    let pages = pipeline.render(&set);
    // summary, comparison, three entity pages, risk, projections, raw
    // data, methodology.
    assert_eq!(pages.len(), 9);
    assert_eq!(pages[0].slug, "summary");
    assert_eq!(pages[2].slug, "entity-alpha");
    assert_eq!(pages.last().unwrap().slug, "methodology");
}
