mod config;

use crate::config::Config;
use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use team_names_core::date_filter::filter_directory;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting league season filter...");

    let config = Config::from_env()?;
    if !config.input_dir.is_dir() {
        bail!("Directory {} does not exist", config.input_dir.display());
    }

    info!(
        "Keeping matches from {} onwards: {} -> {}",
        config.cutoff_date,
        config.input_dir.display(),
        config.output_dir.display()
    );

    let summary = filter_directory(
        &config.input_dir,
        &config.output_dir,
        &config.date_column,
        config.cutoff_date,
        &config.output_suffix,
    )
    .context("Filtering failed")?;

    if summary.files_found == 0 {
        warn!("No CSV files found in {}", config.input_dir.display());
        return Ok(());
    }

    for (path, err) in &summary.errors {
        warn!("Error processing {}: {}", path.display(), err);
    }
    info!(
        "Successfully processed {} out of {} files ({} skipped)",
        summary.files_written.len(),
        summary.files_found,
        summary.files_skipped.len()
    );
    info!("Filtered files saved in: {}", config.output_dir.display());

    Ok(())
}
