use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use team_names_core::MatchThresholds;

#[derive(Debug, Clone)]
pub struct Config {
    pub fixtures_dirs: Vec<PathBuf>,
    pub league_dirs: Vec<PathBuf>,
    pub output_dir: PathBuf,

    pub left_label: String,
    pub right_label: String,

    pub thresholds: MatchThresholds,
    pub write_json: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = MatchThresholds::default();

        let thresholds = MatchThresholds {
            suggest: parse_f64_env("SUGGEST_THRESHOLD", defaults.suggest)?,
            search: parse_f64_env("SEARCH_THRESHOLD", defaults.search)?,
            accept: parse_f64_env("ACCEPT_THRESHOLD", defaults.accept)?,
            apply: parse_f64_env("APPLY_THRESHOLD", defaults.apply)?,
            highly_recommended: parse_f64_env(
                "HIGHLY_RECOMMENDED_THRESHOLD",
                defaults.highly_recommended,
            )?,
            suggestion_limit: parse_usize_env("SUGGESTION_LIMIT", defaults.suggestion_limit)?,
        };
        thresholds
            .validate()
            .context("Invalid threshold configuration")?;

        Ok(Self {
            fixtures_dirs: parse_list_env("FIXTURES_DIRS", "fixtures"),
            league_dirs: parse_list_env("LEAGUE_DIRS", "leagues/main,leagues/other2025"),
            output_dir: PathBuf::from(env::var("OUTPUT_DIR").unwrap_or_else(|_| ".".to_string())),
            left_label: env::var("LEFT_LABEL").unwrap_or_else(|_| "Fixtures".to_string()),
            right_label: env::var("RIGHT_LABEL").unwrap_or_else(|_| "Leagues".to_string()),
            thresholds,
            write_json: parse_bool_env("WRITE_JSON", true),
        })
    }
}

fn parse_list_env(key: &str, default: &str) -> Vec<PathBuf> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn parse_bool_env(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "y" | "on"))
        .unwrap_or(default)
}

fn parse_f64_env(key: &str, default: f64) -> Result<f64> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid {key}: {raw} (expected number)"))
}

fn parse_usize_env(key: &str, default: usize) -> Result<usize> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<usize>()
        .with_context(|| format!("Invalid {key}: {raw} (expected integer)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_env() {
        env::set_var("ANALYZER_TEST_DIRS", " leagues/main , ,leagues/other2025");
        assert_eq!(
            parse_list_env("ANALYZER_TEST_DIRS", "x"),
            vec![PathBuf::from("leagues/main"), PathBuf::from("leagues/other2025")]
        );
        assert_eq!(
            parse_list_env("ANALYZER_TEST_DIRS_UNSET", "fixtures"),
            vec![PathBuf::from("fixtures")]
        );
    }

    #[test]
    fn test_parse_bool_env() {
        env::set_var("ANALYZER_TEST_BOOL", "Yes");
        assert!(parse_bool_env("ANALYZER_TEST_BOOL", false));
        env::set_var("ANALYZER_TEST_BOOL_OFF", "0");
        assert!(!parse_bool_env("ANALYZER_TEST_BOOL_OFF", true));
        assert!(parse_bool_env("ANALYZER_TEST_BOOL_UNSET", true));
    }

    #[test]
    fn test_parse_f64_env() {
        env::set_var("ANALYZER_TEST_F64", "0.75");
        assert_eq!(parse_f64_env("ANALYZER_TEST_F64", 0.1).unwrap(), 0.75);
        env::set_var("ANALYZER_TEST_F64_BAD", "high");
        assert!(parse_f64_env("ANALYZER_TEST_F64_BAD", 0.1).is_err());
        assert_eq!(parse_f64_env("ANALYZER_TEST_F64_UNSET", 0.6).unwrap(), 0.6);
    }
}
