mod config;

use crate::config::Config;
use anyhow::{bail, Context, Result};
use dotenv::dotenv;
use team_names_core::apply::{
    create_backup, update_fixture_dir, write_update_log, ApplyMode, UpdateSummary,
};
use team_names_core::MappingTable;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Changes listed per file when SHOW_CHANGES is off.
const CHANGE_PREVIEW: usize = 5;

fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting fixture name updater...");

    let config = Config::from_env()?;

    if !config.fixtures_dir.is_dir() {
        bail!("Fixtures directory {} not found", config.fixtures_dir.display());
    }

    let table = MappingTable::load_csv(&config.mapping_file, config.apply_threshold)
        .with_context(|| format!("Failed to load {}", config.mapping_file.display()))?;
    if table.is_empty() {
        warn!(
            "No mappings at or above {:.2} in {}, nothing to apply",
            config.apply_threshold,
            config.mapping_file.display()
        );
        return Ok(());
    }

    info!("Loaded {} mappings:", table.len());
    for entry in table.iter() {
        info!(
            "  '{}' -> '{}' ({:.2})",
            entry.source, entry.target, entry.confidence
        );
    }

    if config.dry_run {
        info!("Dry run: previewing changes...");
        let preview = update_fixture_dir(&config.fixtures_dir, &table, ApplyMode::Preview)
            .context("Preview failed")?;
        log_summary(&preview, config.show_changes);
    }

    if !config.auto_apply {
        if config.dry_run {
            info!("AUTO_APPLY is off, fixture files left unchanged");
        } else {
            warn!("Neither DRY_RUN nor AUTO_APPLY is set, nothing to do");
        }
        return Ok(());
    }

    if config.create_backup {
        create_backup(&config.fixtures_dir).context("Backup failed, not applying changes")?;
    }

    let summary = update_fixture_dir(&config.fixtures_dir, &table, ApplyMode::Commit)
        .context("Update failed")?;
    log_summary(&summary, config.show_changes);

    let log_path = write_update_log(&config.log_dir, &summary, &table, ApplyMode::Commit)
        .context("Failed to write update log")?;
    info!("Update log written to {}", log_path.display());

    Ok(())
}

fn log_summary(summary: &UpdateSummary, show_all: bool) {
    info!("=== Summary ===");
    info!("Files processed: {}", summary.files_processed);
    info!("Files with changes: {}", summary.files_updated);
    info!("Total changes: {}", summary.total_changes);

    for update in &summary.updates {
        info!("{}: {} changes", update.path.display(), update.changes.len());
        let shown = if show_all {
            update.changes.len()
        } else {
            CHANGE_PREVIEW
        };
        for change in update.changes.iter().take(shown) {
            info!("  {}", change);
        }
        if update.changes.len() > shown {
            info!("  ... and {} more", update.changes.len() - shown);
        }
    }

    for (path, err) in &summary.errors {
        warn!("Skipped {}: {}", path.display(), err);
    }
}
