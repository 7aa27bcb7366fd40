//! Builders for the fixed page set. Formatting and selection of computed
//! values only; nothing in here derives a new number beyond unit display.

use report_core::{
    AnalysisSet, BenchmarkBasis, ChartKind, ChartSpec, EntityAnalysis, GapPolicy, Metric,
    Narrative, NarrativeTone, PageModel, Projection, ReportConfig, Section, Series, Table,
};

use crate::narrative::{self, NarrativeContext};

/// Fallback colors when an entity carries none, cycled by entity position.
const PALETTE: [&str; 6] = [
    "#6366F1", "#10B981", "#F59E0B", "#E60028", "#0E6938", "#3B82F6",
];

/// Metric order plotted on the radar; leverage is shown inverted as
/// solidity.
const RADAR_ORDER: [Metric; 5] = [
    Metric::Roe,
    Metric::Roa,
    Metric::Margin,
    Metric::EquityRatio,
    Metric::Leverage,
];

pub(crate) fn slugify(ticker: &str) -> String {
    ticker
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

fn color_for(analysis: &EntityAnalysis, index: usize) -> Option<String> {
    analysis
        .entity
        .color
        .clone()
        .or_else(|| Some(PALETTE[index % PALETTE.len()].to_string()))
}

fn billions(value: f64) -> String {
    format!("{:.1}", value / 1e9)
}

fn score3(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.3}", v),
        None => "n/a".to_string(),
    }
}

fn cv2(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}

fn table(title: &str, columns: &[&str], rows: Vec<Vec<String>>) -> Section {
    Section::Table(Table {
        title: Some(title.to_string()),
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows,
    })
}

fn line_chart(title: &str, x_label: &str, y_label: &str, series: Vec<Series>) -> Section {
    Section::Chart(ChartSpec {
        kind: ChartKind::Line,
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        series,
    })
}

/// One line series per comparative entity for a derived metric.
fn metric_series(set: &AnalysisSet, metric: Metric) -> Vec<Series> {
    set.entities
        .iter()
        .enumerate()
        .filter(|(_, e)| e.comparative)
        .map(|(index, e)| Series {
            name: e.entity.name.clone(),
            color: color_for(e, index),
            x: e.metrics.iter().map(|m| m.year.to_string()).collect(),
            values: e.metric_series(metric),
        })
        .collect()
}

fn growth_series(
    set: &AnalysisSet,
    accessor: fn(&report_core::GrowthSet) -> Option<f64>,
) -> Vec<Series> {
    set.entities
        .iter()
        .enumerate()
        .filter(|(_, e)| e.comparative)
        .map(|(index, e)| Series {
            name: e.entity.name.clone(),
            color: color_for(e, index),
            x: e.growth.iter().map(|g| g.year.to_string()).collect(),
            values: e.growth.iter().map(accessor).collect(),
        })
        .collect()
}

fn line_item_series(
    set: &AnalysisSet,
    accessor: fn(&report_core::FiscalYearRecord) -> f64,
) -> Vec<Series> {
    set.entities
        .iter()
        .enumerate()
        .filter(|(_, e)| e.comparative)
        .map(|(index, e)| Series {
            name: e.entity.name.clone(),
            color: color_for(e, index),
            x: e.entity.records.iter().map(|r| r.year.to_string()).collect(),
            values: e
                .entity
                .records
                .iter()
                .map(|r| Some(accessor(r) / 1e9))
                .collect(),
        })
        .collect()
}

pub(crate) fn summary_page(set: &AnalysisSet) -> PageModel {
    let mut sections = Vec::new();

    sections.push(table(
        "Report overview",
        &["Item", "Value"],
        vec![
            vec![
                "Period".to_string(),
                format!("{} - {}", set.first_year, set.latest_year),
            ],
            vec!["Entities".to_string(), set.entities.len().to_string()],
            vec![
                "In comparative scope".to_string(),
                set.comparative().count().to_string(),
            ],
            vec!["Indicators".to_string(), Metric::ALL.len().to_string()],
        ],
    ));

    let ranking_rows = set
        .ranking
        .iter()
        .enumerate()
        .map(|(rank, score)| {
            let analysis = set
                .entities
                .iter()
                .find(|e| e.entity.ticker == score.ticker);
            let name = analysis
                .map(|a| a.entity.name.clone())
                .unwrap_or_else(|| score.ticker.clone());
            let latest = analysis.and_then(|a| a.latest_metrics());
            vec![
                (rank + 1).to_string(),
                name,
                format!("{:.3}", score.score),
                Metric::Roe.format_opt(latest.and_then(|m| m.roe)),
                Metric::Roa.format_opt(latest.and_then(|m| m.roa)),
            ]
        })
        .collect();
    sections.push(table(
        "Composite ranking",
        &["Rank", "Entity", "Composite score", "ROE", "ROA"],
        ranking_rows,
    ));

    sections.push(line_chart(
        "Return on Equity over time",
        "Year",
        "ROE",
        metric_series(set, Metric::Roe),
    ));
    sections.push(line_chart(
        "Revenue growth (% YoY)",
        "Year",
        "Growth %",
        growth_series(set, |g| g.revenue_growth),
    ));
    sections.push(line_chart(
        "Net income growth (% YoY)",
        "Year",
        "Growth %",
        growth_series(set, |g| g.net_income_growth),
    ));
    sections.push(line_chart(
        "Total assets growth (% YoY)",
        "Year",
        "Growth %",
        growth_series(set, |g| g.assets_growth),
    ));

    for metric in [Metric::Roe, Metric::Roa, Metric::Margin] {
        sections.push(Section::Chart(ChartSpec {
            kind: ChartKind::Box,
            title: format!("{} distribution", metric.label()),
            x_label: "Entity".to_string(),
            y_label: metric.label().to_string(),
            series: metric_series(set, metric),
        }));
    }

    PageModel {
        title: "Summary".to_string(),
        slug: "summary".to_string(),
        sections,
    }
}

pub(crate) fn comparison_page(set: &AnalysisSet) -> PageModel {
    let mut sections = Vec::new();

    let latest_rows = set
        .comparative()
        .map(|e| {
            let m = e.latest_metrics();
            vec![
                e.entity.name.clone(),
                Metric::Roe.format_opt(m.and_then(|m| m.roe)),
                Metric::Roa.format_opt(m.and_then(|m| m.roa)),
                Metric::Margin.format_opt(m.and_then(|m| m.margin)),
                Metric::Leverage.format_opt(m.and_then(|m| m.leverage)),
                Metric::EquityRatio.format_opt(m.and_then(|m| m.equity_ratio)),
                score3(e.composite),
            ]
        })
        .collect();
    sections.push(table(
        "Latest-year comparison",
        &[
            "Entity",
            "ROE",
            "ROA",
            "Profit Margin",
            "Leverage",
            "Equity Ratio",
            "Composite",
        ],
        latest_rows,
    ));

    let class_rows = set
        .comparative()
        .map(|e| {
            let mut row = vec![e.entity.name.clone()];
            for metric in Metric::ALL {
                let cell = e
                    .benchmarks
                    .get(&metric)
                    .copied()
                    .flatten()
                    .map(|a| format!("{} ({})", a.class.label(), metric.format(a.value)))
                    .unwrap_or_else(|| "n/a".to_string());
                row.push(cell);
            }
            row
        })
        .collect();
    sections.push(table(
        "Benchmark classification",
        &[
            "Entity",
            "ROE",
            "ROA",
            "Profit Margin",
            "Leverage",
            "Equity Ratio",
        ],
        class_rows,
    ));

    let heat_series = set
        .entities
        .iter()
        .enumerate()
        .filter(|(_, e)| e.comparative)
        .map(|(index, e)| Series {
            name: e.entity.name.clone(),
            color: color_for(e, index),
            x: Metric::ALL.iter().map(|m| m.label().to_string()).collect(),
            values: Metric::ALL
                .iter()
                .map(|m| {
                    e.benchmarks
                        .get(m)
                        .copied()
                        .flatten()
                        .map(|a| a.class.tier() as f64)
                })
                .collect(),
        })
        .collect();
    sections.push(Section::Chart(ChartSpec {
        kind: ChartKind::Heatmap,
        title: "Benchmark tiers (2 = outperform, 0 = underperform)".to_string(),
        x_label: "Indicator".to_string(),
        y_label: "Entity".to_string(),
        series: heat_series,
    }));

    let radar_labels: Vec<String> = RADAR_ORDER
        .iter()
        .map(|m| {
            if m.lower_is_better() {
                "Solidity (inverse leverage)".to_string()
            } else {
                m.label().to_string()
            }
        })
        .collect();
    let radar_series = set
        .entities
        .iter()
        .enumerate()
        .filter(|(_, e)| e.comparative)
        .map(|(index, e)| Series {
            name: e.entity.name.clone(),
            color: color_for(e, index),
            x: radar_labels.clone(),
            values: RADAR_ORDER
                .iter()
                .map(|m| {
                    set.normalized_latest
                        .get(&e.entity.ticker)
                        .and_then(|values| values.get(m).copied())
                })
                .collect(),
        })
        .collect();
    sections.push(Section::Chart(ChartSpec {
        kind: ChartKind::Radar,
        title: format!("Multi-dimensional performance, {}", set.latest_year),
        x_label: "Dimension".to_string(),
        y_label: "Normalized".to_string(),
        series: radar_series,
    }));

    let risk_return_series = set
        .entities
        .iter()
        .enumerate()
        .filter(|(_, e)| e.comparative)
        .map(|(index, e)| {
            let pairs: Vec<(f64, f64)> = e
                .metrics
                .iter()
                .filter_map(|m| m.leverage.zip(m.roe))
                .collect();
            Series {
                name: e.entity.name.clone(),
                color: color_for(e, index),
                x: pairs
                    .iter()
                    .map(|(leverage, _)| format!("{:.2}", leverage))
                    .collect(),
                values: pairs.iter().map(|(_, roe)| Some(*roe)).collect(),
            }
        })
        .collect();
    sections.push(line_chart(
        "Risk vs return: leverage against ROE",
        "Leverage ratio (risk)",
        "ROE (return)",
        risk_return_series,
    ));

    sections.push(line_chart(
        "Leverage ratio",
        "Year",
        "Liabilities / Equity",
        metric_series(set, Metric::Leverage),
    ));
    sections.push(line_chart(
        "Equity ratio (%)",
        "Year",
        "Equity / Assets %",
        metric_series(set, Metric::EquityRatio),
    ));
    sections.push(line_chart(
        "Total assets (bn)",
        "Year",
        "Assets, billions",
        line_item_series(set, |r| r.total_assets),
    ));
    sections.push(line_chart(
        "Total equity (bn)",
        "Year",
        "Equity, billions",
        line_item_series(set, |r| r.total_equity),
    ));

    PageModel {
        title: "Comparison".to_string(),
        slug: "comparison".to_string(),
        sections,
    }
}

pub(crate) fn entity_page(analysis: &EntityAnalysis) -> PageModel {
    let mut sections = Vec::new();
    let latest = analysis.latest_metrics();
    let roe_volatility = analysis.volatility.get(&Metric::Roe).copied().flatten();

    if !analysis.comparative {
        let reason = if analysis.gap_years.is_empty() {
            "history below the minimum-years threshold".to_string()
        } else {
            format!(
                "gap years in history: {}",
                analysis
                    .gap_years
                    .iter()
                    .map(|y| y.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        };
        sections.push(Section::Narrative(Narrative {
            heading: "Data coverage".to_string(),
            items: vec![report_core::NarrativeItem {
                tone: NarrativeTone::Weakness,
                text: format!("Excluded from comparative analytics: {reason}"),
            }],
        }));
    }

    let roe_trend = match analysis.projections.get(&Metric::Roe) {
        Some(Projection::Fitted(trend)) => trend.trend.label().to_string(),
        Some(Projection::InsufficientData { observations }) => {
            format!("Insufficient data ({observations} yr)")
        }
        None => "n/a".to_string(),
    };
    let mut indicator_rows = Vec::new();
    for metric in Metric::ALL {
        indicator_rows.push(vec![
            metric.label().to_string(),
            metric.format_opt(latest.and_then(|m| m.get(metric))),
        ]);
    }
    indicator_rows.push(vec!["Composite score".to_string(), score3(analysis.composite)]);
    indicator_rows.push(vec!["ROE trend".to_string(), roe_trend]);
    indicator_rows.push(vec![
        "ROE change over period".to_string(),
        match analysis.roe_period_change_pct {
            Some(change) => format!("{:+.1}%", change),
            None => "n/a".to_string(),
        },
    ]);
    sections.push(table(
        "Latest indicators",
        &["Indicator", "Value"],
        indicator_rows,
    ));

    if analysis.comparative {
        let ctx = NarrativeContext {
            latest_roe: latest.and_then(|m| m.roe),
            mean_roe: roe_volatility.map(|p| p.mean),
            roe_change_pct: analysis.roe_period_change_pct,
            latest_margin: latest.and_then(|m| m.margin),
            latest_leverage: latest.and_then(|m| m.leverage),
            roe_cv: roe_volatility.and_then(|p| p.cv),
        };
        let items = narrative::items(&ctx);
        for (heading, tone) in [
            ("Strengths", NarrativeTone::Strength),
            ("Areas to improve", NarrativeTone::Weakness),
            ("Recommendations", NarrativeTone::Recommendation),
        ] {
            let grouped: Vec<_> = items.iter().filter(|i| i.tone == tone).cloned().collect();
            if !grouped.is_empty() {
                sections.push(Section::Narrative(Narrative {
                    heading: heading.to_string(),
                    items: grouped,
                }));
            }
        }

        let volatility_rows = Metric::ALL
            .iter()
            .map(|metric| {
                match analysis.volatility.get(metric).copied().flatten() {
                    Some(profile) => vec![
                        metric.label().to_string(),
                        metric.format(profile.mean),
                        metric.format(profile.std_dev),
                        cv2(profile.cv),
                        profile.observations.to_string(),
                    ],
                    None => vec![
                        metric.label().to_string(),
                        "n/a".to_string(),
                        "n/a".to_string(),
                        "n/a".to_string(),
                        "n/a".to_string(),
                    ],
                }
            })
            .collect();
        sections.push(table(
            "Volatility profile",
            &["Indicator", "Mean", "Std dev", "CV", "Years"],
            volatility_rows,
        ));
    }

    PageModel {
        title: analysis.entity.name.clone(),
        slug: format!("entity-{}", slugify(&analysis.entity.ticker)),
        sections,
    }
}

pub(crate) fn risk_page(set: &AnalysisSet) -> PageModel {
    let mut sections = Vec::new();

    let solidity_rows = set
        .comparative()
        .map(|e| {
            let m = e.latest_metrics();
            let leverage_class = e
                .benchmarks
                .get(&Metric::Leverage)
                .copied()
                .flatten()
                .map(|a| a.class.label().to_string())
                .unwrap_or_else(|| "n/a".to_string());
            vec![
                e.entity.name.clone(),
                Metric::Leverage.format_opt(m.and_then(|m| m.leverage)),
                Metric::EquityRatio.format_opt(m.and_then(|m| m.equity_ratio)),
                leverage_class,
            ]
        })
        .collect();
    sections.push(table(
        "Financial solidity",
        &["Entity", "Leverage", "Equity Ratio", "Leverage vs sector"],
        solidity_rows,
    ));

    let cv_rows = set
        .comparative()
        .map(|e| {
            let cv_of = |metric: Metric| {
                cv2(e
                    .volatility
                    .get(&metric)
                    .copied()
                    .flatten()
                    .and_then(|p| p.cv))
            };
            vec![
                e.entity.name.clone(),
                cv_of(Metric::Roe),
                cv_of(Metric::Roa),
                cv_of(Metric::Margin),
            ]
        })
        .collect();
    sections.push(table(
        "Coefficient of variation",
        &["Entity", "ROE CV", "ROA CV", "Margin CV"],
        cv_rows,
    ));

    let cv_series = Series {
        name: "ROE coefficient of variation".to_string(),
        color: None,
        x: set.comparative().map(|e| e.entity.name.clone()).collect(),
        values: set
            .comparative()
            .map(|e| {
                e.volatility
                    .get(&Metric::Roe)
                    .copied()
                    .flatten()
                    .and_then(|p| p.cv)
            })
            .collect(),
    };
    sections.push(Section::Chart(ChartSpec {
        kind: ChartKind::Bar,
        title: "Profitability stability (lower is steadier)".to_string(),
        x_label: "Entity".to_string(),
        y_label: "ROE CV".to_string(),
        series: vec![cv_series],
    }));

    PageModel {
        title: "Risk & Solidity".to_string(),
        slug: "risk".to_string(),
        sections,
    }
}

pub(crate) fn projections_page(set: &AnalysisSet, config: &ReportConfig) -> PageModel {
    let mut sections = Vec::new();
    let horizon = config.projection_horizon_years;

    for metric in Metric::ALL {
        let mut columns = vec!["Entity".to_string(), "Slope".to_string(), "Trend".to_string()];
        for offset in 1..=horizon {
            columns.push(format!("Year +{offset}"));
        }
        let rows = set
            .comparative()
            .map(|e| {
                let mut row = vec![e.entity.name.clone()];
                match e.projections.get(&metric) {
                    Some(Projection::Fitted(trend)) => {
                        row.push(format!("{:+.4}", trend.slope));
                        row.push(trend.trend.label().to_string());
                        for point in &trend.projected {
                            row.push(format!("{} ({})", metric.format(point.value), point.year));
                        }
                    }
                    Some(Projection::InsufficientData { observations }) => {
                        row.push("n/a".to_string());
                        row.push(format!("Insufficient data ({observations} yr)"));
                        for _ in 1..=horizon {
                            row.push("n/a".to_string());
                        }
                    }
                    None => {
                        row.push("n/a".to_string());
                        row.push("n/a".to_string());
                        for _ in 1..=horizon {
                            row.push("n/a".to_string());
                        }
                    }
                }
                row
            })
            .collect();
        sections.push(Section::Table(Table {
            title: Some(format!("{} projection", metric.label())),
            columns,
            rows,
        }));
    }

    let projected_roe_series = set
        .entities
        .iter()
        .enumerate()
        .filter(|(_, e)| e.comparative)
        .map(|(index, e)| {
            let mut x: Vec<String> = e.metrics.iter().map(|m| m.year.to_string()).collect();
            let mut values = e.metric_series(Metric::Roe);
            if let Some(Projection::Fitted(trend)) = e.projections.get(&Metric::Roe) {
                for point in &trend.projected {
                    x.push(format!("{} (proj)", point.year));
                    values.push(Some(point.value));
                }
            }
            Series {
                name: e.entity.name.clone(),
                color: color_for(e, index),
                x,
                values,
            }
        })
        .collect();
    sections.push(line_chart(
        "ROE history and linear projection",
        "Year",
        "ROE",
        projected_roe_series,
    ));

    PageModel {
        title: "Projections".to_string(),
        slug: "projections".to_string(),
        sections,
    }
}

pub(crate) fn raw_data_page(set: &AnalysisSet) -> PageModel {
    let mut sections = Vec::new();

    for analysis in &set.entities {
        let entity = &analysis.entity;
        let mut title = format!("{} ({})", entity.name, entity.ticker);
        if !analysis.comparative {
            title.push_str(" [excluded from comparative stages]");
        }

        let mut rows = Vec::new();
        if let (Some(first), Some(last)) = (entity.first_year(), entity.latest_year()) {
            for year in first..=last {
                match entity.records.iter().find(|r| r.year == year) {
                    Some(r) => rows.push(vec![
                        year.to_string(),
                        billions(r.revenue),
                        billions(r.net_income),
                        billions(r.total_assets),
                        billions(r.total_liabilities),
                        billions(r.total_equity),
                    ]),
                    None => rows.push(vec![
                        format!("{year} (missing)"),
                        "—".to_string(),
                        "—".to_string(),
                        "—".to_string(),
                        "—".to_string(),
                        "—".to_string(),
                    ]),
                }
            }
        }

        sections.push(Section::Table(Table {
            title: Some(title),
            columns: vec![
                "Year".to_string(),
                "Revenue (bn)".to_string(),
                "Net income (bn)".to_string(),
                "Total assets (bn)".to_string(),
                "Total liabilities (bn)".to_string(),
                "Total equity (bn)".to_string(),
            ],
            rows,
        }));
    }

    PageModel {
        title: "Raw Data".to_string(),
        slug: "raw-data".to_string(),
        sections,
    }
}

pub(crate) fn methodology_page(set: &AnalysisSet, config: &ReportConfig) -> PageModel {
    let mut sections = Vec::new();

    sections.push(table(
        "Formulas",
        &["Indicator", "Formula"],
        vec![
            vec!["ROE".to_string(), "Net income / Total equity".to_string()],
            vec!["ROA".to_string(), "Net income / Total assets".to_string()],
            vec![
                "Profit Margin".to_string(),
                "Net income / Revenue × 100".to_string(),
            ],
            vec![
                "Leverage Ratio".to_string(),
                "Total liabilities / Total equity".to_string(),
            ],
            vec![
                "Equity Ratio".to_string(),
                "Total equity / Total assets × 100".to_string(),
            ],
            vec![
                "Growth".to_string(),
                "Year-over-year change × 100".to_string(),
            ],
        ],
    ));

    let basis_label = match config.benchmark_basis {
        BenchmarkBasis::Latest => "latest defined value",
        BenchmarkBasis::Average => "average of defined values",
    };
    let benchmark_rows = Metric::ALL
        .iter()
        .filter_map(|metric| {
            config.benchmarks.get(metric).map(|spec| {
                vec![
                    metric.label().to_string(),
                    metric.format(spec.reference),
                    format!("-{:.0}%", spec.band * 100.0),
                    format!("+{:.0}%", spec.upper_band.unwrap_or(spec.band) * 100.0),
                    if metric.lower_is_better() {
                        "lower is better".to_string()
                    } else {
                        "higher is better".to_string()
                    },
                ]
            })
        })
        .collect();
    sections.push(table(
        &format!("Benchmark references (basis: {basis_label})"),
        &["Indicator", "Reference", "Band below", "Band above", "Direction"],
        benchmark_rows,
    ));

    let weight_rows = config
        .weights
        .iter()
        .map(|(metric, weight)| vec![metric.label().to_string(), format!("{:.2}", weight)])
        .collect();
    sections.push(table(
        "Composite weights",
        &["Indicator", "Weight"],
        weight_rows,
    ));

    let gap_label = match config.gap_policy {
        GapPolicy::SkipYear => "skip the missing year (series shrinks)",
        GapPolicy::ExcludeEntity => "exclude the entity from comparative stages",
    };
    sections.push(table(
        "Parameters",
        &["Parameter", "Value"],
        vec![
            vec![
                "Projection horizon".to_string(),
                format!("{} years", config.projection_horizon_years),
            ],
            vec![
                "Trend threshold".to_string(),
                format!(
                    "{:.2} × |mean| (slope within the band reads as flat)",
                    config.trend_threshold
                ),
            ],
            vec![
                "Minimum years (volatility)".to_string(),
                config.min_years_volatility.to_string(),
            ],
            vec![
                "Minimum years (projection)".to_string(),
                config.min_years_projection.to_string(),
            ],
            vec!["Gap-year policy".to_string(), gap_label.to_string()],
            vec![
                "Period analyzed".to_string(),
                format!("{} - {}", set.first_year, set.latest_year),
            ],
        ],
    ));

    sections.push(table(
        "Interpretation bands",
        &["Indicator", "Reading"],
        vec![
            vec![
                "ROE".to_string(),
                "> 0.10 excellent · 0.08-0.10 good · 0.05-0.08 acceptable · < 0.05 weak"
                    .to_string(),
            ],
            vec![
                "Leverage Ratio".to_string(),
                "< 10 very solid · 10-15 balanced · > 15 elevated risk".to_string(),
            ],
            vec![
                "Equity Ratio".to_string(),
                "> 8% strong capitalization · 5-8% acceptable · < 5% vulnerable".to_string(),
            ],
            vec![
                "Coefficient of variation".to_string(),
                "< 0.20 high stability · 0.20-0.40 moderate · > 0.40 high volatility".to_string(),
            ],
        ],
    ));

    PageModel {
        title: "Methodology".to_string(),
        slug: "methodology".to_string(),
        sections,
    }
}
