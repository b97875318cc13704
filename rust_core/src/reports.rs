//! CSV and JSON reports of one reconciliation run.

use crate::error::{ReconcileError, Result};
use crate::mapping_table::MappingTable;
use crate::reconcile::{ReconciliationResult, Suggestions};
use crate::types::{Candidate, NameMapping, NameSet, TeamName};
use crate::utils::matching::format_confidence;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

pub const FIXTURE_TEAMS_FILE: &str = "fixture_teams.csv";
pub const LEAGUE_TEAMS_FILE: &str = "league_teams.csv";
pub const COMPARISON_FILE: &str = "team_comparison_results.csv";
pub const RECOMMENDED_FILE: &str = "recommended_mappings.csv";
pub const MAPPING_JSON_FILE: &str = "team_mappings.json";

/// Suggestions shown per one-sided row of the comparison table.
const COMPARISON_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    Exact,
    LeftOnly,
    RightOnly,
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchStatus::Exact => "Exact Match",
            MatchStatus::LeftOnly => "Left Only",
            MatchStatus::RightOnly => "Right Only",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamListRow {
    #[serde(rename = "Team Name")]
    pub team_name: String,
    #[serde(rename = "Source")]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Similar Names")]
    pub similar_names: String,
    #[serde(rename = "Best Match")]
    pub best_match: String,
    #[serde(rename = "Confidence")]
    pub confidence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedRow {
    #[serde(rename = "Left Name")]
    pub left_name: String,
    #[serde(rename = "Right Name")]
    pub right_name: String,
    #[serde(rename = "Confidence")]
    pub confidence: String,
    #[serde(rename = "Action")]
    pub action: String,
}

// ============================================================================
// Row builders
// ============================================================================

pub fn team_list_rows(names: &NameSet, label: &str) -> Vec<TeamListRow> {
    names
        .iter()
        .map(|name| TeamListRow {
            team_name: name.as_str().to_string(),
            source: label.to_string(),
        })
        .collect()
}

/// Exact rows, then left-only, then right-only; each group in key order.
pub fn comparison_rows(result: &ReconciliationResult) -> Vec<ComparisonRow> {
    let mut rows: Vec<ComparisonRow> = result
        .exact
        .iter()
        .map(|name| ComparisonRow {
            name: name.as_str().to_string(),
            status: MatchStatus::Exact.to_string(),
            similar_names: String::new(),
            best_match: String::new(),
            confidence: format_confidence(1.0),
        })
        .collect();

    rows.extend(one_sided_rows(
        &result.left_only,
        &result.left_suggestions,
        MatchStatus::LeftOnly,
    ));
    rows.extend(one_sided_rows(
        &result.right_only,
        &result.right_suggestions,
        MatchStatus::RightOnly,
    ));
    rows
}

fn one_sided_rows<'a>(
    names: &'a NameSet,
    suggestions: &'a Suggestions,
    status: MatchStatus,
) -> impl Iterator<Item = ComparisonRow> + 'a {
    names.iter().map(move |name| {
        let candidates = suggestions.get(name).map(Vec::as_slice).unwrap_or_default();
        comparison_row(name, candidates, status)
    })
}

fn comparison_row(
    name: &TeamName,
    candidates: &[Candidate],
    status: MatchStatus,
) -> ComparisonRow {
    let (similar_names, best_match, confidence) = match candidates.first() {
        Some(best) => (
            candidates
                .iter()
                .take(COMPARISON_SUGGESTIONS)
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            best.name.as_str().to_string(),
            best.score,
        ),
        None => ("No matches".to_string(), String::new(), 0.0),
    };

    ComparisonRow {
        name: name.as_str().to_string(),
        status: status.to_string(),
        similar_names,
        best_match,
        confidence: format_confidence(confidence),
    }
}

/// High-confidence mappings, in the order the mapper ranked them.
pub fn recommended_rows(result: &ReconciliationResult) -> Vec<RecommendedRow> {
    result
        .high_confidence
        .iter()
        .map(|m: &NameMapping| RecommendedRow {
            left_name: m.source.as_str().to_string(),
            right_name: m.target.as_str().to_string(),
            confidence: format_confidence(m.confidence),
            action: result
                .thresholds
                .confidence(m.confidence)
                .action_label()
                .to_string(),
        })
        .collect()
}

// ============================================================================
// Writers
// ============================================================================

fn write_rows<T: Serialize>(path: &Path, rows: &[T], headers: &[&str]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| ReconcileError::csv(path, e))?;

    // header row is written even for empty reports
    writer
        .write_record(headers)
        .map_err(|e| ReconcileError::csv(path, e))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| ReconcileError::csv(path, e))?;
    }
    writer.flush().map_err(|e| ReconcileError::io(path, e))
}

pub fn write_team_list(path: &Path, names: &NameSet, label: &str) -> Result<()> {
    write_rows(path, &team_list_rows(names, label), &["Team Name", "Source"])
}

pub fn write_comparison(path: &Path, result: &ReconciliationResult) -> Result<()> {
    write_rows(
        path,
        &comparison_rows(result),
        &["Name", "Status", "Similar Names", "Best Match", "Confidence"],
    )
}

pub fn write_recommended(path: &Path, result: &ReconciliationResult) -> Result<()> {
    write_rows(
        path,
        &recommended_rows(result),
        &["Left Name", "Right Name", "Confidence", "Action"],
    )
}

pub fn write_mapping_json(path: &Path, result: &ReconciliationResult) -> Result<()> {
    MappingTable::from_result(result).save_json(path)
}

/// Output locations of one analysis run.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub fixture_teams: PathBuf,
    pub league_teams: PathBuf,
    pub comparison: PathBuf,
    pub recommended: PathBuf,
    pub mapping_json: PathBuf,
}

impl ReportPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            fixture_teams: dir.join(FIXTURE_TEAMS_FILE),
            league_teams: dir.join(LEAGUE_TEAMS_FILE),
            comparison: dir.join(COMPARISON_FILE),
            recommended: dir.join(RECOMMENDED_FILE),
            mapping_json: dir.join(MAPPING_JSON_FILE),
        }
    }
}

/// Input sets and labels the team list reports are built from.
pub struct ReportInput<'a> {
    pub left: &'a NameSet,
    pub right: &'a NameSet,
    pub left_label: &'a str,
    pub right_label: &'a str,
}

/// Write every report; the JSON export only when `write_json` is set.
pub fn write_all(
    paths: &ReportPaths,
    input: &ReportInput<'_>,
    result: &ReconciliationResult,
    write_json: bool,
) -> Result<()> {
    write_team_list(&paths.fixture_teams, input.left, input.left_label)?;
    write_team_list(&paths.league_teams, input.right, input.right_label)?;
    write_comparison(&paths.comparison, result)?;
    write_recommended(&paths.recommended, result)?;
    if write_json {
        write_mapping_json(&paths.mapping_json, result)?;
    }

    info!(
        "Reports written: {}, {}, {}, {}",
        paths.fixture_teams.display(),
        paths.league_teams.display(),
        paths.comparison.display(),
        paths.recommended.display()
    );
    Ok(())
}
