use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub fixtures_dir: PathBuf,
    pub mapping_file: PathBuf,
    pub log_dir: PathBuf,

    /// Mappings below this confidence are never loaded
    pub apply_threshold: f64,

    pub dry_run: bool,
    pub auto_apply: bool,
    pub create_backup: bool,
    pub show_changes: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let apply_threshold =
            parse_f64_env("APPLY_THRESHOLD", 0.6).context("APPLY_THRESHOLD")?;
        if !(0.0..=1.0).contains(&apply_threshold) {
            return Err(anyhow!(
                "Invalid APPLY_THRESHOLD: {apply_threshold} (expected 0.0 - 1.0)"
            ));
        }

        Ok(Self {
            fixtures_dir: path_env("FIXTURES_DIR", "fixtures"),
            mapping_file: path_env("MAPPING_FILE", "recommended_mappings.csv"),
            log_dir: path_env("LOG_DIR", "."),
            apply_threshold,
            dry_run: parse_bool_env("DRY_RUN", true),
            auto_apply: parse_bool_env("AUTO_APPLY", false),
            create_backup: parse_bool_env("CREATE_BACKUP", true),
            show_changes: parse_bool_env("SHOW_CHANGES", false),
        })
    }
}

fn path_env(key: &str, default: &str) -> PathBuf {
    PathBuf::from(env::var(key).unwrap_or_else(|_| default.to_string()))
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
