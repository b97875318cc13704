//! Season filter for raw league files: keep matches on or after a cutoff date.

use crate::error::{ReconcileError, Result};
use crate::sources::list_csv_files;
use crate::utils::matching::normalize_header;
use chrono::{Datelike, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Four-digit-year formats, tried in order.
const DATE_FORMATS: [&str; 4] = ["%d%m%Y", "%d/%m/%Y", "%Y-%m-%d", "%m/%d/%Y"];

/// Parse a match date cell. Two-digit years (`%d/%m/%y`) are the last resort.
pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .find(|date| date.year() >= 1000)
        .or_else(|| NaiveDate::parse_from_str(raw, "%d/%m/%y").ok())
}

/// Parse a `YYYY-MM-DD` cutoff.
pub fn parse_cutoff(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ReconcileError::InvalidDate {
        value: raw.to_string(),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub original_rows: usize,
    pub dated_rows: usize,
    pub kept_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    Written(FilterStats),
    MissingDateColumn,
    NoParseableDates,
}

/// Copy the rows of `input` dated on or after `cutoff` into `output`.
///
/// Nothing is written when the date column is absent or no date parses.
pub fn filter_file_by_date(
    input: &Path,
    output: &Path,
    date_column: &str,
    cutoff: NaiveDate,
) -> Result<FilterOutcome> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(input)
        .map_err(|e| ReconcileError::csv(input, e))?;
    let headers = reader
        .headers()
        .map_err(|e| ReconcileError::csv(input, e))?
        .clone();

    let wanted = normalize_header(date_column);
    let Some(date_col) = headers.iter().position(|h| normalize_header(h) == wanted) else {
        return Ok(FilterOutcome::MissingDateColumn);
    };

    let mut stats = FilterStats::default();
    let mut kept = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("{}: skipping malformed row {}: {}", input.display(), idx + 2, e);
                continue;
            }
        };
        stats.original_rows += 1;

        let Some(date) = record.get(date_col).and_then(parse_match_date) else {
            continue;
        };
        stats.dated_rows += 1;
        if date >= cutoff {
            kept.push(record);
        }
    }

    if stats.dated_rows == 0 {
        return Ok(FilterOutcome::NoParseableDates);
    }
    stats.kept_rows = kept.len();

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(output)
        .map_err(|e| ReconcileError::csv(output, e))?;
    writer
        .write_record(&headers)
        .map_err(|e| ReconcileError::csv(output, e))?;
    for record in &kept {
        writer
            .write_record(record)
            .map_err(|e| ReconcileError::csv(output, e))?;
    }
    writer.flush().map_err(|e| ReconcileError::io(output, e))?;

    Ok(FilterOutcome::Written(stats))
}

#[derive(Debug, Clone, Default)]
pub struct FilterSummary {
    pub files_found: usize,
    pub files_written: Vec<(PathBuf, FilterStats)>,
    pub files_skipped: Vec<PathBuf>,
    pub errors: Vec<(PathBuf, String)>,
}

/// Filter every CSV in `input_dir` into `<stem><suffix>.csv` under `output_dir`.
pub fn filter_directory(
    input_dir: &Path,
    output_dir: &Path,
    date_column: &str,
    cutoff: NaiveDate,
    suffix: &str,
) -> Result<FilterSummary> {
    let files = list_csv_files(input_dir)?;
    fs::create_dir_all(output_dir).map_err(|e| ReconcileError::io(output_dir, e))?;
    info!("Found {} CSV files in {}", files.len(), input_dir.display());

    let mut summary = FilterSummary {
        files_found: files.len(),
        ..Default::default()
    };

    for input in files {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = output_dir.join(format!("{stem}{suffix}.csv"));

        match filter_file_by_date(&input, &output, date_column, cutoff) {
            Ok(FilterOutcome::Written(stats)) => {
                info!(
                    "{}: {} rows, {} dated, {} from {} onwards",
                    input.display(),
                    stats.original_rows,
                    stats.dated_rows,
                    stats.kept_rows,
                    cutoff
                );
                summary.files_written.push((output, stats));
            }
            Ok(FilterOutcome::MissingDateColumn) => {
                warn!("No '{}' column in {}, skipping", date_column, input.display());
                summary.files_skipped.push(input);
            }
            Ok(FilterOutcome::NoParseableDates) => {
                warn!("Could not parse any dates in {}, skipping", input.display());
                summary.files_skipped.push(input);
            }
            Err(e) => {
                error!("{}", e);
                summary.errors.push((input, e.to_string()));
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!(parse_match_date("20082025"), Some(date(2025, 8, 20)));
        assert_eq!(parse_match_date("20/08/2025"), Some(date(2025, 8, 20)));
        assert_eq!(parse_match_date("2025-08-20"), Some(date(2025, 8, 20)));
        assert_eq!(parse_match_date("08/20/2025"), Some(date(2025, 8, 20)));
    }

    #[test]
    fn test_day_first_wins_when_ambiguous() {
        assert_eq!(parse_match_date("03/04/2025"), Some(date(2025, 4, 3)));
    }

    #[test]
    fn test_two_digit_year() {
        assert_eq!(parse_match_date("20/08/25"), Some(date(2025, 8, 20)));
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse_match_date(""), None);
        assert_eq!(parse_match_date("TBD"), None);
        assert_eq!(parse_match_date("32/13/2025"), None);
    }

    #[test]
    fn test_parse_cutoff() {
        assert_eq!(parse_cutoff("2025-08-20").unwrap(), date(2025, 8, 20));
        assert!(matches!(
            parse_cutoff("20/08/2025"),
            Err(ReconcileError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_filter_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("arg.csv");
        let output = dir.path().join("arg2025.csv");
        fs::write(
            &input,
            "Date,Home,Away\n\
             19/08/2025,Boca,River\n\
             20/08/2025,Racing,Independiente\n\
             TBD,Huracan,Lanus\n\
             01/09/2025,Velez,Tigre\n",
        )
        .unwrap();

        let outcome = filter_file_by_date(&input, &output, "Date", date(2025, 8, 20)).unwrap();
        assert_eq!(
            outcome,
            FilterOutcome::Written(FilterStats {
                original_rows: 4,
                dated_rows: 3,
                kept_rows: 2,
            })
        );
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "Date,Home,Away\n20/08/2025,Racing,Independiente\n01/09/2025,Velez,Tigre\n"
        );
    }

    #[test]
    fn test_filter_file_skips() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.csv");

        let no_column = dir.path().join("a.csv");
        fs::write(&no_column, "Home,Away\nA,B\n").unwrap();
        assert_eq!(
            filter_file_by_date(&no_column, &output, "Date", date(2025, 8, 20)).unwrap(),
            FilterOutcome::MissingDateColumn
        );

        let no_dates = dir.path().join("b.csv");
        fs::write(&no_dates, "Date,Home,Away\nTBD,A,B\n").unwrap();
        assert_eq!(
            filter_file_by_date(&no_dates, &output, "Date", date(2025, 8, 20)).unwrap(),
            FilterOutcome::NoParseableDates
        );
        assert!(!output.exists());
    }

    #[test]
    fn test_filter_directory() {
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("other");
        let output = root.path().join("leagues").join("other2025");
        fs::create_dir(&input).unwrap();
        fs::write(input.join("ARG.csv"), "Date,Home,Away\n25/08/2025,Boca,River\n").unwrap();
        fs::write(input.join("BRA.csv"), "Round,Home,Away\n1,Santos,Gremio\n").unwrap();

        let summary =
            filter_directory(&input, &output, "Date", date(2025, 8, 20), "2025").unwrap();
        assert_eq!(summary.files_found, 2);
        assert_eq!(summary.files_written.len(), 1);
        assert_eq!(summary.files_skipped.len(), 1);
        assert!(output.join("ARG2025.csv").exists());
    }
}
