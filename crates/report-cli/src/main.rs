use anyhow::{Context, Result};
use chrono::Utc;
use report_core::ReportConfig;
use report_pipeline::ReportPipeline;
use statement_store::StatementStore;
use tracing::info;

fn main() -> Result<()> {
    // 1. Load .env, init tracing
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    // 2. Resolve paths, CLI args win over env
    let mut args = std::env::args().skip(1);
    let input = args
        .next()
        .or_else(|| std::env::var("REPORT_INPUT").ok())
        .unwrap_or_else(|| "demos/statements.json".to_string());
    let config_path = args
        .next()
        .or_else(|| std::env::var("REPORT_CONFIG").ok())
        .unwrap_or_else(|| "demos/config.json".to_string());
    let output = args
        .next()
        .or_else(|| std::env::var("REPORT_OUTPUT").ok())
        .unwrap_or_else(|| "report.html".to_string());
    let title = std::env::var("REPORT_TITLE")
        .unwrap_or_else(|_| "Comparative Bank Analysis".to_string());

    info!(%input, config = %config_path, %output, "starting report generation");

    // 3. Load, analyze, write
    let config = ReportConfig::from_json_file(&config_path)
        .with_context(|| format!("loading config from {config_path}"))?;
    let statements = StatementStore::load_file(&input)
        .with_context(|| format!("loading statements from {input}"))?;
    let pipeline = ReportPipeline::new(config)?;
    let meta = pipeline
        .run(&statements, &title, &output, Utc::now())
        .context("report generation failed")?;

    info!(
        path = %meta.path.display(),
        pages = meta.pages,
        bytes = meta.bytes,
        "report written"
    );
    Ok(())
}
