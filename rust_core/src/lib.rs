//! Team Names Core - fuzzy reconciliation of team names across data sources.
//!
//! This module provides:
//! - Case-insensitive Ratcliff/Obershelp similarity scoring
//! - Top-N candidate search with deterministic tie-breaking
//! - Exact / one-sided partition of two name sets with suggestions
//! - Greedy injective name mapping with confidence tiers
//! - CSV sources, reports, mapping tables and fixture rewriting
//! - Season date filtering of raw league files

pub mod apply;
pub mod date_filter;
pub mod error;
pub mod mapping_table;
pub mod matching;
pub mod reconcile;
pub mod reports;
pub mod sources;
mod types;
pub mod utils;

use std::path::Path;
use tracing::info;

pub use error::{ReconcileError, Result};
pub use mapping_table::MappingTable;
pub use matching::{similarity, MatchConfidence, MatchThresholds, NameScorer, SequenceRatio};
pub use reconcile::{ensure_usable, NameReconciler, ReconciliationResult};
pub use sources::{load_team_names, SourceLoad};
pub use types::*;

/// Both loaded sides plus the reconciliation of the two.
#[derive(Debug)]
pub struct Analysis {
    pub left: SourceLoad,
    pub right: SourceLoad,
    pub result: ReconciliationResult,
}

/// Load every CSV under both directory lists and reconcile the names.
///
/// Fails when either side yields no names at all.
pub fn analyze_dirs<L: AsRef<Path>, R: AsRef<Path>>(
    left_dirs: &[L],
    right_dirs: &[R],
    labels: (&str, &str),
    thresholds: MatchThresholds,
) -> Result<Analysis> {
    let reconciler = NameReconciler::new(thresholds)?;

    let left = load_team_names(left_dirs);
    info!("Loaded {} unique {} team names", left.names.len(), labels.0);
    let right = load_team_names(right_dirs);
    info!("Loaded {} unique {} team names", right.names.len(), labels.1);

    ensure_usable(&left.names, &right.names, labels.0, labels.1)?;
    let result = reconciler.run(&left.names, &right.names);

    Ok(Analysis {
        left,
        right,
        result,
    })
}
