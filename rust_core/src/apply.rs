//! Fixture updater: rewrites home/away team names through a mapping table.
//!
//! A file is read in full, rewritten into a fresh row collection, and only
//! written back (atomically) in commit mode when something changed.

use crate::error::{ReconcileError, Result};
use crate::mapping_table::MappingTable;
use crate::sources::{detect_team_columns, list_csv_files, TeamColumns};
use chrono::{DateTime, Local};
use csv::StringRecord;
use std::fmt;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Home => "Home",
            Side::Away => "Away",
        })
    }
}

/// One cell rewrite. `row` is the spreadsheet row (data index + 2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameChange {
    pub row: usize,
    pub side: Side,
    pub old: String,
    pub new: String,
}

impl fmt::Display for NameChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {} ({}): '{}' -> '{}'", self.row, self.side, self.old, self.new)
    }
}

/// Rewritten rows plus the changes that produced them.
#[derive(Debug, Clone, Default)]
pub struct RewriteOutcome {
    pub rows: Vec<StringRecord>,
    pub changes: Vec<NameChange>,
}

/// Build rewritten copies of `rows`; the input is left untouched.
///
/// Cells already equal to their target are not counted as changes.
pub fn rewrite_rows(
    rows: &[StringRecord],
    columns: &TeamColumns,
    table: &MappingTable,
) -> RewriteOutcome {
    let mut outcome = RewriteOutcome {
        rows: Vec::with_capacity(rows.len()),
        changes: Vec::new(),
    };

    for (idx, record) in rows.iter().enumerate() {
        let mut fields: Vec<String> = record.iter().map(str::to_string).collect();

        for (col, side) in [(columns.home, Side::Home), (columns.away, Side::Away)] {
            let Some(cell) = fields.get_mut(col) else {
                continue;
            };
            let Some(target) = table.lookup(cell) else {
                continue;
            };
            if cell.as_str() != target.as_str() {
                outcome.changes.push(NameChange {
                    row: idx + 2,
                    side,
                    old: cell.clone(),
                    new: target.as_str().to_string(),
                });
                *cell = target.as_str().to_string();
            }
        }

        outcome.rows.push(StringRecord::from(fields));
    }

    outcome
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Report would-be changes, write nothing
    Preview,
    /// Write changed files back in place
    Commit,
}

/// Result of processing one fixture file.
#[derive(Debug, Clone)]
pub struct FileUpdate {
    pub path: PathBuf,
    pub changes: Vec<NameChange>,
    pub written: bool,
}

/// Rewrite one fixture file. A malformed row aborts the file untouched.
pub fn update_fixture_file(
    path: &Path,
    table: &MappingTable,
    mode: ApplyMode,
) -> Result<FileUpdate> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| ReconcileError::csv(path, e))?;
    let headers = reader
        .headers()
        .map_err(|e| ReconcileError::csv(path, e))?
        .clone();

    let columns = detect_team_columns(&headers).ok_or_else(|| ReconcileError::MissingColumns {
        path: path.to_path_buf(),
        expected: "home and away team".to_string(),
    })?;

    let rows = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ReconcileError::csv(path, e))?;

    let outcome = rewrite_rows(&rows, &columns, table);
    let written = mode == ApplyMode::Commit && !outcome.changes.is_empty();
    if written {
        write_atomically(path, &headers, &outcome.rows)?;
        info!("Updated {} ({} changes)", path.display(), outcome.changes.len());
    } else {
        debug!(
            "{}: {} changes ({:?})",
            path.display(),
            outcome.changes.len(),
            mode
        );
    }

    Ok(FileUpdate {
        path: path.to_path_buf(),
        changes: outcome.changes,
        written,
    })
}

fn write_atomically(path: &Path, headers: &StringRecord, rows: &[StringRecord]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| ReconcileError::io(dir, e))?;

    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(temp);
    writer
        .write_record(headers)
        .map_err(|e| ReconcileError::csv(path, e))?;
    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| ReconcileError::csv(path, e))?;
    }

    let temp = writer
        .into_inner()
        .map_err(|e| ReconcileError::io(path, e.into_error()))?;
    temp.persist(path)
        .map_err(|e| ReconcileError::io(path, e.error))?;
    Ok(())
}

/// Totals of one directory update.
#[derive(Debug, Clone, Default)]
pub struct UpdateSummary {
    pub files_processed: usize,
    pub files_updated: usize,
    pub total_changes: usize,
    pub updates: Vec<FileUpdate>,
    pub errors: Vec<(PathBuf, String)>,
}

/// Apply the table to every CSV in `dir`. Per-file failures are recorded.
pub fn update_fixture_dir(dir: &Path, table: &MappingTable, mode: ApplyMode) -> Result<UpdateSummary> {
    let files = list_csv_files(dir)?;
    info!("Processing {} fixture files in {}", files.len(), dir.display());

    let mut summary = UpdateSummary::default();
    for path in files {
        match update_fixture_file(&path, table, mode) {
            Ok(update) => {
                summary.files_processed += 1;
                summary.total_changes += update.changes.len();
                if !update.changes.is_empty() {
                    summary.files_updated += 1;
                    summary.updates.push(update);
                }
            }
            Err(e) => {
                error!("{}", e);
                summary.errors.push((path, e.to_string()));
            }
        }
    }

    Ok(summary)
}

/// Copy `dir` to `<dir>_backup_<timestamp>` next to it.
pub fn create_backup(dir: &Path) -> Result<PathBuf> {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "fixtures".to_string());
    let stamp = Local::now().format(TIMESTAMP_FORMAT);
    let target = dir.with_file_name(format!("{name}_backup_{stamp}"));

    if target.exists() {
        return Err(ReconcileError::BackupExists(target));
    }
    copy_dir(dir, &target)?;
    info!("Created backup: {}", target.display());
    Ok(target)
}

fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to).map_err(|e| ReconcileError::io(to, e))?;
    for entry in fs::read_dir(from).map_err(|e| ReconcileError::io(from, e))? {
        let entry = entry.map_err(|e| ReconcileError::io(from, e))?;
        let source = entry.path();
        let dest = to.join(entry.file_name());
        if source.is_dir() {
            copy_dir(&source, &dest)?;
        } else {
            fs::copy(&source, &dest).map_err(|e| ReconcileError::io(&source, e))?;
        }
    }
    Ok(())
}

/// Plain-text update log: summary, per-file changes and the mappings used.
pub struct UpdateLog<'a> {
    pub summary: &'a UpdateSummary,
    pub table: &'a MappingTable,
    pub mode: ApplyMode,
    pub generated: DateTime<Local>,
}

impl fmt::Display for UpdateLog<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.summary;
        writeln!(f, "Fixture Update Log")?;
        writeln!(f, "Generated: {}", self.generated.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Mode: {:?}", self.mode)?;
        writeln!(f)?;
        writeln!(f, "Files processed: {}", summary.files_processed)?;
        writeln!(f, "Files updated: {}", summary.files_updated)?;
        writeln!(f, "Total changes: {}", summary.total_changes)?;

        if !summary.updates.is_empty() {
            writeln!(f)?;
            writeln!(f, "Changes by file:")?;
            for update in &summary.updates {
                writeln!(f, "{}:", update.path.display())?;
                for change in &update.changes {
                    writeln!(f, "  {}", change)?;
                }
            }
        }

        if !summary.errors.is_empty() {
            writeln!(f)?;
            writeln!(f, "Errors:")?;
            for (path, err) in &summary.errors {
                writeln!(f, "  {}: {}", path.display(), err)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Mappings applied:")?;
        for entry in self.table.iter() {
            writeln!(
                f,
                "  {} -> {} ({:.2})",
                entry.source, entry.target, entry.confidence
            )?;
        }
        Ok(())
    }
}

/// Render the update log stamped with the current local time.
pub fn render_update_log(summary: &UpdateSummary, table: &MappingTable, mode: ApplyMode) -> String {
    UpdateLog {
        summary,
        table,
        mode,
        generated: Local::now(),
    }
    .to_string()
}

/// Write `fixture_update_log_<timestamp>.txt` into `dir`.
pub fn write_update_log(
    dir: &Path,
    summary: &UpdateSummary,
    table: &MappingTable,
    mode: ApplyMode,
) -> Result<PathBuf> {
    let path = dir.join(format!(
        "fixture_update_log_{}.txt",
        Local::now().format(TIMESTAMP_FORMAT)
    ));
    let mut file = fs::File::create(&path).map_err(|e| ReconcileError::io(&path, e))?;
    file.write_all(render_update_log(summary, table, mode).as_bytes())
        .map_err(|e| ReconcileError::io(&path, e))?;

    if !summary.errors.is_empty() {
        warn!("{} files failed, see {}", summary.errors.len(), path.display());
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MappingTable {
        let mut table = MappingTable::new();
        table.insert("Man City", "Manchester City", 0.7);
        table.insert("Spurs", "Tottenham", 0.9);
        table.insert("Arsenal", "Arsenal", 1.0);
        table
    }

    fn fixture(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_rewrite_rows_builds_new_rows() {
        let columns = TeamColumns {
            home: 1,
            away: 2,
            home_header: "HomeTeam".to_string(),
            away_header: "AwayTeam".to_string(),
        };
        let rows = vec![
            StringRecord::from(vec!["01/08/2025", "man city", "Arsenal"]),
            StringRecord::from(vec!["02/08/2025", "Chelsea", "Spurs"]),
        ];

        let outcome = rewrite_rows(&rows, &columns, &table());

        assert_eq!(&rows[0][1], "man city");
        assert_eq!(&outcome.rows[0][1], "Manchester City");
        assert_eq!(&outcome.rows[1][2], "Tottenham");
        assert_eq!(
            outcome.changes,
            vec![
                NameChange {
                    row: 2,
                    side: Side::Home,
                    old: "man city".to_string(),
                    new: "Manchester City".to_string(),
                },
                NameChange {
                    row: 3,
                    side: Side::Away,
                    old: "Spurs".to_string(),
                    new: "Tottenham".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_change_display() {
        let change = NameChange {
            row: 5,
            side: Side::Away,
            old: "Spurs".to_string(),
            new: "Tottenham".to_string(),
        };
        assert_eq!(change.to_string(), "Row 5 (Away): 'Spurs' -> 'Tottenham'");
    }

    #[test]
    fn test_preview_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let body = "Date,HomeTeam,AwayTeam\n01/08/2025,Man City,Chelsea\n";
        let path = fixture(dir.path(), "epl.csv", body);

        let update = update_fixture_file(&path, &table(), ApplyMode::Preview).unwrap();
        assert_eq!(update.changes.len(), 1);
        assert!(!update.written);
        assert_eq!(fs::read_to_string(&path).unwrap(), body);
    }

    #[test]
    fn test_commit_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixture(
            dir.path(),
            "epl.csv",
            "Date,HomeTeam,AwayTeam\n01/08/2025,Man City,Spurs\n",
        );

        let update = update_fixture_file(&path, &table(), ApplyMode::Commit).unwrap();
        assert!(update.written);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Date,HomeTeam,AwayTeam\n01/08/2025,Manchester City,Tottenham\n"
        );
    }

    #[test]
    fn test_missing_columns_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixture(dir.path(), "odd.csv", "Date,Team\n01/08/2025,Arsenal\n");
        let err = update_fixture_file(&path, &table(), ApplyMode::Commit).unwrap_err();
        assert!(matches!(err, ReconcileError::MissingColumns { .. }));
    }

    #[test]
    fn test_update_dir_summary() {
        let dir = tempfile::tempdir().unwrap();
        fixture(
            dir.path(),
            "a.csv",
            "HomeTeam,AwayTeam\nMan City,Spurs\nArsenal,Chelsea\n",
        );
        fixture(dir.path(), "b.csv", "HomeTeam,AwayTeam\nArsenal,Chelsea\n");
        fixture(dir.path(), "c.csv", "Date,Score\n1,2\n");

        let summary = update_fixture_dir(dir.path(), &table(), ApplyMode::Preview).unwrap();
        assert_eq!(summary.files_processed, 2);
        assert_eq!(summary.files_updated, 1);
        assert_eq!(summary.total_changes, 2);
        assert_eq!(summary.errors.len(), 1);
    }

    #[test]
    fn test_create_backup_copies_files() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("fixtures");
        fs::create_dir(&dir).unwrap();
        fixture(&dir, "a.csv", "HomeTeam,AwayTeam\nA,B\n");

        let backup = create_backup(&dir).unwrap();
        let name = backup.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("fixtures_backup_"));
        assert_eq!(
            fs::read_to_string(backup.join("a.csv")).unwrap(),
            "HomeTeam,AwayTeam\nA,B\n"
        );
    }

    #[test]
    fn test_update_log() {
        let dir = tempfile::tempdir().unwrap();
        fixture(dir.path(), "a.csv", "HomeTeam,AwayTeam\nMan City,Spurs\n");
        let table = table();
        let summary = update_fixture_dir(dir.path(), &table, ApplyMode::Preview).unwrap();

        let log = render_update_log(&summary, &table, ApplyMode::Preview);
        assert!(log.contains("Total changes: 2"));
        assert!(log.contains("Row 2 (Home): 'Man City' -> 'Manchester City'"));
        assert!(log.contains("Spurs -> Tottenham (0.90)"));

        let path = write_update_log(dir.path(), &summary, &table, ApplyMode::Preview).unwrap();
        assert!(path
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("fixture_update_log_"));
    }

    #[test]
    fn test_update_log_layout() {
        use chrono::TimeZone;

        let summary = UpdateSummary {
            files_processed: 1,
            errors: vec![(PathBuf::from("bad.csv"), "malformed row 3".to_string())],
            ..Default::default()
        };
        let log = UpdateLog {
            summary: &summary,
            table: &table(),
            mode: ApplyMode::Commit,
            generated: Local.with_ymd_and_hms(2025, 8, 1, 9, 30, 0).unwrap(),
        }
        .to_string();

        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(
            &lines[..7],
            &[
                "Fixture Update Log",
                "Generated: 2025-08-01 09:30:00",
                "Mode: Commit",
                "",
                "Files processed: 1",
                "Files updated: 0",
                "Total changes: 0",
            ]
        );
        assert!(!log.contains("Changes by file:"));
        assert!(log.contains("Errors:\n  bad.csv: malformed row 3\n"));
        assert!(log.ends_with("Spurs -> Tottenham (0.90)\n"));
    }
}
