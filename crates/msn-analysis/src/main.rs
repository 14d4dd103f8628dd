//! CLI entry point for the MSN republishing analysis.

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use clap::{Parser, ValueEnum};
use msn_analysis::export::{self, format_decimal, format_percent, format_thousands};
use msn_analysis::{
    AnalysisConfig, AnalysisError, AnalysisReport, AnalysisResult, AnalysisSession, DisplayLimit,
    Pipeline, PortalFilter, ReportView, TableInfo,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// CLI-compatible display limit enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDisplayLimit {
    /// Show the five articles with the most page views
    Top5,
    /// Show the ten articles with the most page views
    Top10,
    /// Show every article
    All,
}

impl From<CliDisplayLimit> for DisplayLimit {
    fn from(cli: CliDisplayLimit) -> Self {
        match cli {
            CliDisplayLimit::Top5 => DisplayLimit::Top5,
            CliDisplayLimit::Top10 => DisplayLimit::Top10,
            CliDisplayLimit::All => DisplayLimit::All,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "MSN republishing analysis",
    long_about = "Merges the MSN content report with the page-view export and derives\n\
                  engagement metrics per article, portal and time of day.\n\n\
                  EXAMPLES:\n  \
                  # Analyse both default portals and write the workbook to ./output\n  \
                  msn-analysis -c inhalte.csv -v aufrufe.csv\n\n  \
                  # Only HNA, show every article, semicolon-separated exports\n  \
                  msn-analysis -c inhalte.csv -v aufrufe.csv --portal HNA --top all --separator ';'\n\n  \
                  # Custom allow-list, JSON to stdout\n  \
                  msn-analysis -c inhalte.csv -v aufrufe.csv -b HNA -b Merkur --json"
)]
struct Args {
    /// Path to the content catalog export ("Inhaltsbericht")
    #[arg(short, long)]
    catalog: PathBuf,

    /// Path to the page-view export ("Seitenaufrufe")
    #[arg(short, long)]
    views: PathBuf,

    /// Portal to report on ("Alle" for every allowed portal)
    #[arg(short, long, default_value = "Alle")]
    portal: String,

    /// Number of articles listed in the overview
    #[arg(short, long, value_enum, default_value = "top10")]
    top: CliDisplayLimit,

    /// Allowed portal (repeatable). Defaults to HNA and Frankfurter Rundschau
    #[arg(short = 'b', long = "brand")]
    brands: Vec<String>,

    /// Field separator of both input files
    #[arg(long, default_value = ",")]
    separator: char,

    /// Output directory for the workbook
    #[arg(short, long, default_value = "./output")]
    output: PathBuf,

    /// Also write the detail table as CSV next to the workbook
    #[arg(long)]
    csv: bool,

    /// Do not write the workbook
    #[arg(long)]
    no_export: bool,

    /// Keep the parsed column types instead of narrowing them
    #[arg(long)]
    no_optimize: bool,

    /// Output JSON to stdout instead of the human-readable dashboard
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Convert a library error into the message shown to the user.
fn user_error(error: AnalysisError) -> anyhow::Error {
    anyhow!(error.user_message())
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;
    let pipeline = build_pipeline(&args, config)?;
    let mut session = AnalysisSession::with_pipeline(pipeline);

    let catalog = read_input(&args.catalog)?;
    let views = read_input(&args.views)?;

    let info = session
        .upload_catalog(&source_name(&args.catalog), &catalog)
        .map_err(user_error)?;
    log_table(info);
    let info = session
        .upload_views(&source_name(&args.views), &views)
        .map_err(user_error)?;
    log_table(info);

    let output_dir = session.config().output_dir.clone();
    let result = session.analyze().map_err(user_error)?;

    let portal = PortalFilter::from_label(&args.portal);
    if let PortalFilter::Portal(name) = &portal
        && !result.brands.contains(name)
    {
        warn!(
            "Portal '{}' is not in the allowed brands ({}); the report will be empty",
            name,
            result.brands.join(", ")
        );
    }
    let view = ReportView::new(result, portal, args.top.into());

    let export_file = if args.no_export {
        None
    } else {
        Some(write_exports(&output_dir, args.csv, &view)?)
    };

    if args.json {
        let report = AnalysisReport::build(
            result,
            &view,
            &args.catalog.display().to_string(),
            &args.views.display().to_string(),
            export_file.map(|p| p.display().to_string()),
        );
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_dashboard(result, &view, export_file.as_deref());
    Ok(())
}

fn build_config(args: &Args) -> Result<AnalysisConfig> {
    let separator = u8::try_from(args.separator)
        .map_err(|_| anyhow!("Separator must be a single ASCII character"))?;

    let mut builder = AnalysisConfig::builder()
        .separator(separator)
        .optimize_memory(!args.no_optimize)
        .output_dir(&args.output);

    if !args.brands.is_empty() {
        builder = builder.allowed_brands(args.brands.iter().cloned());
    }

    Ok(builder.build()?)
}

fn build_pipeline(args: &Args, config: AnalysisConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| info!("{update}"));
    }

    builder.build().map_err(user_error)
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(anyhow!("Input file not found: {}", path.display()));
    }
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("input")
        .to_string()
}

fn log_table(info: &TableInfo) {
    info!(
        "Loaded {} table '{}': {} rows x {} columns",
        info.kind, info.source_name, info.row_count, info.column_count
    );
}

/// Write the workbook (and optionally the CSV) for the filtered rows into
/// the configured output directory.
fn write_exports(output_dir: &Path, csv: bool, view: &ReportView<'_>) -> Result<PathBuf> {
    let today = Local::now().date_naive();
    let workbook =
        export::write_report(output_dir, &view.portal, today, &view.rows).map_err(user_error)?;

    if csv {
        export::write_csv(output_dir, &view.portal, today, &view.rows).map_err(user_error)?;
    }

    Ok(workbook)
}

/// Truncate a string to max characters with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

/// Print the dashboard for the selected portal.
///
/// Note: This function uses `println!` intentionally for user-facing CLI output.
fn print_dashboard(result: &AnalysisResult, view: &ReportView<'_>, export_file: Option<&Path>) {
    let summary = &result.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("MSN REPUBLISHING ANALYSIS");
    println!("{}", "=".repeat(80));
    println!();

    println!("Overall:");
    println!(
        "  Articles: {} ({} with page views)",
        format_thousands(summary.article_count as u64),
        format_thousands(summary.articles_with_views as u64)
    );
    println!("  Page views: {}", format_thousands(summary.total_views));
    println!("  Likes: {}", format_thousands(summary.total_likes));
    println!("  Comments: {}", format_thousands(summary.total_comments));
    println!(
        "  Mean engagement rate: {}",
        format_percent(summary.mean_engagement_rate)
    );
    println!();

    println!("Portals:");
    println!(
        "  {:<24} {:>10} {:>14} {:>12} {:>12} {:>12}",
        "Portal", "Articles", "Page views", "Mean views", "Best time", "Engagement"
    );
    println!("  {}", "-".repeat(88));
    for brand in &result.brands {
        if let Some(stats) = result.segments.get(brand) {
            println!(
                "  {:<24} {:>10} {:>14} {:>12} {:>12} {:>12}",
                truncate_str(&stats.brand, 24),
                format_thousands(stats.article_count as u64),
                format_thousands(stats.total_views),
                format_decimal(stats.mean_views, 0),
                stats.dominant_label(),
                format_percent(stats.mean_engagement_rate)
            );
        }
    }
    println!();

    println!("Selection: {}", view.portal);
    println!(
        "  Articles: {}  Page views: {}  Mean views: {}  Engagement: {}",
        format_thousands(view.metrics.article_count as u64),
        format_thousands(view.metrics.total_views),
        format_decimal(view.metrics.mean_views, 0),
        format_percent(view.metrics.mean_engagement_rate)
    );
    println!();

    if !view.time_of_day.is_empty() {
        println!("Mean page views by time of day:");
        for stats in &view.time_of_day {
            println!(
                "  {:<10} {:>12}  ({} articles)",
                stats.time_of_day.label(),
                format_decimal(stats.mean_views, 2),
                stats.article_count
            );
        }
        println!();
    }

    println!("Articles:");
    println!(
        "  {:<24} {:<40} {:>12} {:>10} {:>10}",
        "Portal", "Title", "Page views", "Engagement", "Time"
    );
    println!("  {}", "-".repeat(100));
    for row in view.displayed() {
        println!(
            "  {:<24} {:<40} {:>12} {:>10} {:>10}",
            truncate_str(&row.article.brand, 24),
            truncate_str(row.article.title.as_deref().unwrap_or("-"), 40),
            format_thousands(row.article.page_views),
            format_percent(row.engagement_rate),
            row.time_of_day.map_or("-", |t| t.label())
        );
    }
    if view.displayed().len() < view.rows.len() {
        println!(
            "  ... and {} more articles (use --top all to list every article)",
            view.rows.len() - view.displayed().len()
        );
    }
    println!();

    if let Some(path) = export_file {
        println!("Workbook: {}", path.display());
    }
    println!("Duration: {}ms", result.duration_ms);
    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> Vec<u8> {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name);
        std::fs::read(path).unwrap()
    }

    #[test]
    fn test_output_flag_reaches_config() {
        let args = Args::try_parse_from([
            "msn-analysis", "-c", "a.csv", "-v", "b.csv", "-o", "reports/msn",
        ])
        .unwrap();
        let config = build_config(&args).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("reports/msn"));
    }

    #[test]
    fn test_exports_land_in_configured_directory() {
        let dir = std::env::temp_dir().join(format!("msn-analysis-cli-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let args = Args::try_parse_from(["msn-analysis", "-c", "a.csv", "-v", "b.csv"]).unwrap();
        let config = AnalysisConfig::builder().output_dir(&dir).build().unwrap();

        let mut session = AnalysisSession::new(config).unwrap();
        session.upload_catalog("catalog.csv", &fixture("catalog.csv")).unwrap();
        session.upload_views("views.csv", &fixture("views.csv")).unwrap();
        let output_dir = session.config().output_dir.clone();
        let result = session.analyze().unwrap();
        let view = ReportView::new(result, PortalFilter::All, args.top.into());

        let workbook = write_exports(&output_dir, true, &view).unwrap();

        assert_eq!(workbook.parent(), Some(dir.as_path()));
        assert_ne!(args.output, dir);
        let written: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(written.len(), 2);
        assert!(written.iter().any(|p| p.extension().is_some_and(|e| e == "csv")));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
