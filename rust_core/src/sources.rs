//! Team name extraction from fixture and league CSV files.
//!
//! Each file is scanned for a home and an away team column. Files without
//! them contribute nothing; malformed rows are skipped and counted.

use crate::error::{ReconcileError, Result};
use crate::types::NameSet;
use crate::utils::matching::normalize_header;
use csv::StringRecord;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

// ============================================================================
// Column detection
// ============================================================================

/// Positions and original headers of the team columns of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamColumns {
    pub home: usize,
    pub away: usize,
    pub home_header: String,
    pub away_header: String,
}

/// Locate the home/away team columns of a header row.
///
/// Tries exact `hometeam`/`awayteam`, then exact `home`/`away`, then the
/// last header mentioning both the side and `team`. A header that names
/// the home team never counts as the away column.
pub fn detect_team_columns(headers: &StringRecord) -> Option<TeamColumns> {
    let normalized: Vec<String> = headers.iter().map(normalize_header).collect();

    let exact = |wanted: &str| normalized.iter().position(|h| h == wanted);
    let names_home = |h: &str| h.contains("home") && h.contains("team");
    let fuzzy = |side: &str| {
        normalized.iter().rposition(|h| {
            h.contains(side) && h.contains("team") && (side == "home" || !names_home(h))
        })
    };

    let (home, away) = match (exact("hometeam"), exact("awayteam")) {
        (Some(h), Some(a)) => (h, a),
        _ => match (exact("home"), exact("away")) {
            (Some(h), Some(a)) => (h, a),
            _ => (fuzzy("home")?, fuzzy("away")?),
        },
    };

    Some(TeamColumns {
        home,
        away,
        home_header: headers.get(home).unwrap_or_default().to_string(),
        away_header: headers.get(away).unwrap_or_default().to_string(),
    })
}

// ============================================================================
// Extraction
// ============================================================================

/// Names found in a single file.
#[derive(Debug, Clone, Default)]
pub struct FileNames {
    pub names: NameSet,
    pub columns: Option<TeamColumns>,
    pub rows_read: usize,
    pub rows_skipped: usize,
}

/// Result of scanning one CSV stream.
#[derive(Debug, Clone)]
pub enum Extraction {
    Found(FileNames),
    MissingColumns { headers: Vec<String> },
}

/// Collect the distinct team names of one CSV stream.
pub fn extract_team_names<R: Read>(input: R) -> std::result::Result<Extraction, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let headers = reader.headers()?.clone();

    let Some(columns) = detect_team_columns(&headers) else {
        return Ok(Extraction::MissingColumns {
            headers: headers.iter().map(str::to_string).collect(),
        });
    };

    let mut found = FileNames::default();
    for (idx, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping malformed row {}: {}", idx + 2, e);
                found.rows_skipped += 1;
                continue;
            }
        };
        found.rows_read += 1;

        for col in [columns.home, columns.away] {
            if let Some(value) = record.get(col) {
                found.names.insert_raw(value);
            }
        }
    }

    found.columns = Some(columns);
    Ok(Extraction::Found(found))
}

/// `*.csv` files directly inside `dir`, in sorted path order.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| ReconcileError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ReconcileError::io(dir, e))?.path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

// ============================================================================
// Directory loading
// ============================================================================

/// Everything learned while loading one side's directories.
#[derive(Debug, Default)]
pub struct SourceLoad {
    pub names: NameSet,
    pub files_processed: usize,
    pub files_without_columns: Vec<PathBuf>,
    pub files_failed: Vec<(PathBuf, String)>,
    pub missing_dirs: Vec<PathBuf>,
    pub rows_skipped: usize,
}

impl SourceLoad {
    /// Files that produced no names because of a problem.
    pub fn error_count(&self) -> usize {
        self.files_without_columns.len() + self.files_failed.len()
    }
}

/// Load and merge the team names of every CSV under `dirs`.
///
/// Missing directories and unreadable files are logged and recorded; the
/// load itself never fails.
pub fn load_team_names<P: AsRef<Path>>(dirs: &[P]) -> SourceLoad {
    let mut load = SourceLoad::default();

    for dir in dirs {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            warn!("Directory {} not found", dir.display());
            load.missing_dirs.push(dir.to_path_buf());
            continue;
        }

        let files = match list_csv_files(dir) {
            Ok(files) => files,
            Err(e) => {
                error!("{}", e);
                load.files_failed.push((dir.to_path_buf(), e.to_string()));
                continue;
            }
        };
        info!("Found {} CSV files in {}", files.len(), dir.display());

        for path in files {
            load_file(&path, &mut load);
        }
    }

    load
}

fn load_file(path: &Path, load: &mut SourceLoad) {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) => {
            error!("Error opening {}: {}", path.display(), e);
            load.files_failed.push((path.to_path_buf(), e.to_string()));
            return;
        }
    };

    match extract_team_names(file) {
        Ok(Extraction::Found(found)) => {
            debug!(
                "{}: {} teams from {} rows",
                path.display(),
                found.names.len(),
                found.rows_read
            );
            if found.rows_skipped > 0 {
                warn!(
                    "{}: skipped {} malformed rows",
                    path.display(),
                    found.rows_skipped
                );
            }
            load.files_processed += 1;
            load.rows_skipped += found.rows_skipped;
            for name in &found.names {
                load.names.insert_raw(name.as_str());
            }
        }
        Ok(Extraction::MissingColumns { headers }) => {
            warn!(
                "Could not find team columns in {}. Available columns: {:?}",
                path.display(),
                headers
            );
            load.files_without_columns.push(path.to_path_buf());
        }
        Err(e) => {
            error!("Error processing {}: {}", path.display(), e);
            load.files_failed.push((path.to_path_buf(), e.to_string()));
        }
    }
}
