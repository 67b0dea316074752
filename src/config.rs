use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::common::error::{CleanerError, Result};
use crate::pipeline::processing::SpreadScope;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub cleaning: CleaningConfig,
    pub dedup: DedupConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory the collectors drop `<source>_<timestamp>.json` files into
    pub staging_dir: PathBuf,
    /// NDJSON store of cleaned records
    pub output_path: PathBuf,
    /// Market summary JSON for the dashboard
    pub summary_path: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("data/raw"),
            output_path: PathBuf::from("data/cleaned/cleaned_jobs.ndjson"),
            summary_path: PathBuf::from("docs/dashboard_data.json"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Run the per-record stages on the rayon thread pool
    pub parallel: bool,
    pub impute_scope: SpreadScope,
    /// Classify postings with no employment descriptor and no title signal as Full-time
    pub assume_full_time_when_unspecified: bool,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            impute_scope: SpreadScope::Global,
            assume_full_time_when_unspecified: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Deduplicate each run against the records already in the store
    pub against_store: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self { against_store: true }
    }
}

impl Config {
    /// Load `path` if it exists (defaults otherwise), then apply `JMC_*` environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                CleanerError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
            })?;
            Self::from_toml(&content)?
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("JMC_STAGING_DIR") {
            self.paths.staging_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("JMC_OUTPUT_PATH") {
            self.paths.output_path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("JMC_LOG_DIR") {
            self.paths.log_dir = PathBuf::from(dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [cleaning]
            impute_scope = "per_source"

            [paths]
            staging_dir = "/opt/airflow/data/raw"
            "#,
        )
        .unwrap();

        assert_eq!(config.cleaning.impute_scope, SpreadScope::PerSource);
        assert!(config.cleaning.parallel);
        assert_eq!(config.paths.staging_dir, PathBuf::from("/opt/airflow/data/raw"));
        assert_eq!(config.paths.log_dir, PathBuf::from("logs"));
        assert!(config.dedup.against_store);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let err = Config::from_toml("[cleaning]\nimpute_scope = \"sideways\"").unwrap_err();
        assert!(matches!(err, CleanerError::Toml(_)));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load(Path::new("definitely/not/here.toml")).unwrap();
        assert!(!config.cleaning.assume_full_time_when_unspecified);
    }
}
