//! Canonical name mapping table.
//!
//! This module provides:
//! - Lookup from a fixture name (by identity key) to its league spelling
//! - Loading from the recommended mappings report
//! - JSON persistence as a flat `{ "from": "to" }` object

use crate::error::{ReconcileError, Result};
use crate::reconcile::ReconciliationResult;
use crate::types::TeamName;
use crate::utils::matching::normalize_header;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub const LEFT_NAME_COLUMN: &str = "Left Name";
pub const RIGHT_NAME_COLUMN: &str = "Right Name";
pub const CONFIDENCE_COLUMN: &str = "Confidence";

/// Older reports name the sides after their sources.
const LEFT_NAME_ALIAS: &str = "Fixture Team";
const RIGHT_NAME_ALIAS: &str = "League Team";

/// One rename held by the table.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingEntry {
    pub source: TeamName,
    pub target: TeamName,
    pub confidence: f64,
}

/// Rename table keyed by the source name's identity key.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: BTreeMap<String, MappingEntry>,
}

impl MappingTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact matches (as identity entries) plus the high-confidence mappings.
    pub fn from_result(result: &ReconciliationResult) -> Self {
        let mut table = Self::new();
        for name in &result.exact {
            table.insert(name.as_str(), name.as_str(), 1.0);
        }
        for mapping in &result.high_confidence {
            table.insert(
                mapping.source.as_str(),
                mapping.target.as_str(),
                mapping.confidence,
            );
        }
        table
    }

    /// Insert a mapping. Blank names are ignored and reported as `false`.
    pub fn insert(&mut self, source: &str, target: &str, confidence: f64) -> bool {
        let (Some(source), Some(target)) = (TeamName::new(source), TeamName::new(target)) else {
            return false;
        };
        self.entries.insert(
            source.key().to_string(),
            MappingEntry {
                source,
                target,
                confidence,
            },
        );
        true
    }

    /// Replacement for a raw cell value, if the table knows it.
    pub fn lookup(&self, raw: &str) -> Option<&TeamName> {
        let name = TeamName::new(raw)?;
        self.entries.get(name.key()).map(|e| &e.target)
    }

    /// Get number of mappings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in source key order.
    pub fn iter(&self) -> impl Iterator<Item = &MappingEntry> + '_ {
        self.entries.values()
    }

    /// Load the recommended mappings report.
    ///
    /// Rows below `min_confidence` are dropped. A missing confidence column
    /// or cell counts as fully confident.
    pub fn load_csv(path: impl AsRef<Path>, min_confidence: f64) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path).map_err(|e| ReconcileError::csv(path, e))?;
        let headers = reader
            .headers()
            .map_err(|e| ReconcileError::csv(path, e))?
            .clone();

        let column = |name: &str| {
            let wanted = normalize_header(name);
            headers.iter().position(|h| normalize_header(h) == wanted)
        };
        let left_col = column(LEFT_NAME_COLUMN).or_else(|| column(LEFT_NAME_ALIAS));
        let right_col = column(RIGHT_NAME_COLUMN).or_else(|| column(RIGHT_NAME_ALIAS));
        let (Some(left_col), Some(right_col)) = (left_col, right_col) else {
            return Err(ReconcileError::MissingColumns {
                path: path.to_path_buf(),
                expected: format!("'{LEFT_NAME_COLUMN}', '{RIGHT_NAME_COLUMN}'"),
            });
        };
        let confidence_col = column(CONFIDENCE_COLUMN);

        let mut table = Self::new();
        for (idx, record) in reader.records().enumerate() {
            let row = idx + 2;
            let record = match record {
                Ok(record) => record,
                Err(e) => {
                    warn!("{}: skipping malformed row {}: {}", path.display(), row, e);
                    continue;
                }
            };

            let confidence = match confidence_col
                .and_then(|c| record.get(c))
                .map(str::trim)
                .filter(|c| !c.is_empty())
            {
                None => 1.0,
                Some(raw) => match raw.parse::<f64>() {
                    Ok(value) if value.is_finite() => value,
                    _ => {
                        warn!(
                            "{}: row {} has invalid confidence {:?}",
                            path.display(),
                            row,
                            raw
                        );
                        continue;
                    }
                },
            };

            if confidence < min_confidence {
                debug!(
                    "{}: row {} below apply threshold ({:.2})",
                    path.display(),
                    row,
                    confidence
                );
                continue;
            }

            let source = record.get(left_col).unwrap_or_default();
            let target = record.get(right_col).unwrap_or_default();
            if !table.insert(source, target, confidence) {
                warn!("{}: row {} has a blank team name", path.display(), row);
            }
        }

        Ok(table)
    }

    /// Load a flat JSON mapping. Entries carry full confidence.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ReconcileError::io(path, e))?;
        let data: BTreeMap<String, String> =
            serde_json::from_str(&content).map_err(|e| ReconcileError::json(path, e))?;

        let mut table = Self::new();
        for (source, target) in data {
            table.insert(&source, &target, 1.0);
        }
        Ok(table)
    }

    /// Save as a flat JSON object `{ "source": "target" }`.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let flat: BTreeMap<&str, &str> = self
            .entries
            .values()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();

        let content =
            serde_json::to_string_pretty(&flat).map_err(|e| ReconcileError::json(path, e))?;
        fs::write(path, content).map_err(|e| ReconcileError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_insert_and_lookup() {
        let mut table = MappingTable::new();
        assert!(table.insert("Man City", "Manchester City", 0.7));
        assert!(table.insert("Spurs", "Tottenham", 0.9));

        assert_eq!(table.lookup("Man City").unwrap().as_str(), "Manchester City");
        assert_eq!(table.lookup("Spurs").unwrap().as_str(), "Tottenham");
        assert!(table.lookup("Chelsea").is_none());
    }

    #[test]
    fn test_case_insensitivity() {
        let mut table = MappingTable::new();
        table.insert("MAN CITY", "Manchester City", 0.7);

        assert!(table.lookup("man city").is_some());
        assert!(table.lookup("  Man  City ").is_some());
    }

    #[test]
    fn test_blank_names_ignored() {
        let mut table = MappingTable::new();
        assert!(!table.insert("", "Chelsea", 1.0));
        assert!(!table.insert("Chelsea", "  ", 1.0));
        assert!(table.is_empty());
    }

    #[test]
    fn test_load_csv_filters_by_confidence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Left Name,Right Name,Confidence,Action").unwrap();
        writeln!(file, "Man City,Manchester City,0.70,Review Recommended").unwrap();
        writeln!(file, "Spurs,Tottenham Hotspur,0.85,Highly Recommended").unwrap();
        writeln!(file, "Wolves,Wolverhampton,0.53,Review Recommended").unwrap();
        writeln!(file, "Forest,Nottingham Forest,abc,Review Recommended").unwrap();
        file.flush().unwrap();

        let table = MappingTable::load_csv(file.path(), 0.6).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.lookup("Wolves").is_none());
        assert!(table.lookup("Forest").is_none());
        assert_eq!(
            table.lookup("spurs").unwrap().as_str(),
            "Tottenham Hotspur"
        );
    }

    #[test]
    fn test_load_csv_rejects_non_finite_confidence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Left Name,Right Name,Confidence").unwrap();
        writeln!(file, "Wolves,Wolverhampton,NaN").unwrap();
        writeln!(file, "Spurs,Tottenham,inf").unwrap();
        writeln!(file, "Man City,Manchester City,0.70").unwrap();
        file.flush().unwrap();

        let table = MappingTable::load_csv(file.path(), 0.6).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.lookup("Wolves").is_none());
        assert!(table.lookup("Spurs").is_none());
        assert!(table.iter().all(|e| e.confidence >= 0.6));
    }

    #[test]
    fn test_load_csv_without_confidence_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "left name,right name").unwrap();
        writeln!(file, "Man Utd,Manchester United").unwrap();
        file.flush().unwrap();

        let table = MappingTable::load_csv(file.path(), 0.6).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.iter().next().unwrap().confidence, 1.0);
    }

    #[test]
    fn test_load_csv_source_named_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Fixture Team,League Team,Confidence,Action").unwrap();
        writeln!(file, "Spurs,Tottenham,0.90,Highly Recommended").unwrap();
        file.flush().unwrap();

        let table = MappingTable::load_csv(file.path(), 0.6).unwrap();
        assert_eq!(table.lookup("Spurs").unwrap().as_str(), "Tottenham");
    }

    #[test]
    fn test_load_csv_missing_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Fixture,League").unwrap();
        writeln!(file, "Man Utd,Manchester United").unwrap();
        file.flush().unwrap();

        let err = MappingTable::load_csv(file.path(), 0.6).unwrap_err();
        assert!(matches!(err, ReconcileError::MissingColumns { .. }));
    }

    #[test]
    fn test_json_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("team_mappings.json");

        let mut table = MappingTable::new();
        table.insert("Arsenal", "Arsenal", 1.0);
        table.insert("Man City", "Manchester City", 0.7);
        table.save_json(&path).unwrap();

        let raw: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["Man City"], "Manchester City");

        let loaded = MappingTable::load_json(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.lookup("man city").unwrap().as_str(), "Manchester City");
    }
}
