mod config;

use crate::config::Config;
use anyhow::{Context, Result};
use dotenv::dotenv;
use std::fs;
use team_names_core::reports::{write_all, ReportInput, ReportPaths};
use team_names_core::{analyze_dirs, Analysis, SourceLoad};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Names listed per section of the run summary.
const SUMMARY_PREVIEW: usize = 10;

fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting team name analysis...");

    let config = Config::from_env()?;
    info!(
        "Comparing {:?} ({}) against {:?} ({})",
        config.fixtures_dirs, config.left_label, config.league_dirs, config.right_label
    );

    let analysis = analyze_dirs(
        &config.fixtures_dirs,
        &config.league_dirs,
        (config.left_label.as_str(), config.right_label.as_str()),
        config.thresholds,
    )
    .context("Team name analysis failed")?;

    report_load(&config.left_label, &analysis.left);
    report_load(&config.right_label, &analysis.right);
    log_summary(&config, &analysis);

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create {}", config.output_dir.display()))?;
    let paths = ReportPaths::in_dir(&config.output_dir);
    let input = ReportInput {
        left: &analysis.left.names,
        right: &analysis.right.names,
        left_label: &config.left_label,
        right_label: &config.right_label,
    };
    write_all(&paths, &input, &analysis.result, config.write_json)
        .context("Failed to write reports")?;

    info!("Analysis complete");
    Ok(())
}

fn report_load(label: &str, load: &SourceLoad) {
    info!(
        "{}: {} files processed, {} unique teams",
        label,
        load.files_processed,
        load.names.len()
    );
    if load.error_count() > 0 {
        warn!(
            "{}: {} files without usable team columns or unreadable",
            label,
            load.error_count()
        );
    }
    if load.rows_skipped > 0 {
        warn!("{}: {} malformed rows skipped", label, load.rows_skipped);
    }
}

fn log_summary(config: &Config, analysis: &Analysis) {
    let result = &analysis.result;

    info!("=== Summary ===");
    info!("Total {} teams: {}", config.left_label, result.left_total);
    info!("Total {} teams: {}", config.right_label, result.right_total);
    info!("Exact matches: {}", result.exact.len());
    info!("{}-only teams: {}", config.left_label, result.left_only.len());
    info!("{}-only teams: {}", config.right_label, result.right_only.len());
    info!("Match percentage: {:.1}%", result.match_percentage());

    let with_suggestions = result
        .left_suggestions
        .values()
        .filter(|s| !s.is_empty())
        .count();
    info!(
        "{}-only teams with similar {} names: {}",
        config.left_label, config.right_label, with_suggestions
    );

    for (name, candidates) in result.left_suggestions.iter().take(SUMMARY_PREVIEW) {
        match candidates.first() {
            Some(best) => info!("  '{}' -> maybe '{}' ({:.2})", name, best.name, best.score),
            None => info!("  '{}' -> no similar names", name),
        }
    }

    info!(
        "Accepted mappings: {} ({} high confidence)",
        result.mappings.len(),
        result.high_confidence.len()
    );
    for mapping in result.mappings.iter().take(SUMMARY_PREVIEW) {
        info!(
            "  '{}' -> '{}' ({:.2}, {})",
            mapping.source,
            mapping.target,
            mapping.confidence,
            result.thresholds.confidence(mapping.confidence).action_label()
        );
    }

    let review = result.review_mappings().count();
    if review > 0 {
        warn!("{} accepted mappings need manual review", review);
    }
    let unresolved = result.unresolved();
    if !unresolved.is_empty() {
        warn!(
            "{} {} teams have no mapping",
            unresolved.len(),
            config.left_label
        );
    }
}
