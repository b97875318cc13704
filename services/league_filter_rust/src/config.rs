use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::env;
use std::path::PathBuf;

use team_names_core::date_filter::parse_cutoff;

#[derive(Debug, Clone)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub cutoff_date: NaiveDate,
    pub output_suffix: String,
    pub date_column: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            input_dir: path_env("INPUT_DIR", "other"),
            output_dir: path_env("OUTPUT_DIR", "leagues/other2025"),
            cutoff_date: parse_date_env("CUTOFF_DATE", "2025-08-20")?,
            output_suffix: env::var("OUTPUT_SUFFIX").unwrap_or_else(|_| "2025".to_string()),
            date_column: env::var("DATE_COLUMN").unwrap_or_else(|_| "Date".to_string()),
        })
    }
}

fn path_env(key: &str, default: &str) -> PathBuf {
    PathBuf::from(env::var(key).unwrap_or_else(|_| default.to_string()))
}

fn parse_date_env(key: &str, default: &str) -> Result<NaiveDate> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    parse_cutoff(&raw).with_context(|| format!("Invalid {key}: {raw} (expected YYYY-MM-DD)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_env() {
        assert_eq!(
            parse_date_env("FILTER_TEST_DATE_UNSET", "2025-08-20").unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 20).unwrap()
        );
        env::set_var("FILTER_TEST_DATE_BAD", "20/08/2025");
        assert!(parse_date_env("FILTER_TEST_DATE_BAD", "2025-08-20").is_err());
    }
}
