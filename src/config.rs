//! Runtime configuration, read once at startup from `FITPRO_*` environment
//! variables.

use std::env;
use std::path::{Path, PathBuf};

use crate::db::DB_FILE_NAME;

pub const APP_IDENTIFIER: &str = "com.fitpro.app";
pub const DEFAULT_LOG_FILTER: &str = "fitpro=info,sqlx=warn";
pub const LOG_FILE_PREFIX: &str = "fitpro.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the database and the `logs/` folder.
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    /// `EnvFilter` directives.
    pub log_filter: String,
    pub log_to_file: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = match var("FITPRO_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };
        let db_path = var("FITPRO_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(DB_FILE_NAME));
        let log_filter = var("FITPRO_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        let log_to_file = !matches!(
            var("FITPRO_LOG_FILE").as_deref().map(str::trim),
            Some("0") | Some("false") | Some("off")
        );

        Ok(Config {
            data_dir,
            db_path,
            log_filter,
            log_to_file,
        })
    }

    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir().map_or_else(env::current_dir, Ok)?;
    Ok(base.join(APP_IDENTIFIER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned()).expect("config")
    }

    #[test]
    fn data_dir_drives_db_and_logs() {
        let cfg = config(&[("FITPRO_DATA_DIR", "/tmp/fit")]);
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/fit").join(DB_FILE_NAME));
        assert_eq!(cfg.log_dir(), PathBuf::from("/tmp/fit/logs"));
        assert_eq!(cfg.log_filter, DEFAULT_LOG_FILTER);
        assert!(cfg.log_to_file);
    }

    #[test]
    fn explicit_db_and_log_settings_win() {
        let cfg = config(&[
            ("FITPRO_DATA_DIR", "/tmp/fit"),
            ("FITPRO_DB", "/elsewhere/x.sqlite3"),
            ("FITPRO_LOG", "fitpro=debug"),
            ("FITPRO_LOG_FILE", "0"),
        ]);
        assert_eq!(cfg.db_path(), Path::new("/elsewhere/x.sqlite3"));
        assert_eq!(cfg.log_filter, "fitpro=debug");
        assert!(!cfg.log_to_file);
    }

    #[test]
    fn blank_values_fall_back() {
        let cfg = config(&[("FITPRO_DATA_DIR", "/tmp/fit"), ("FITPRO_LOG", "  ")]);
        assert_eq!(cfg.log_filter, DEFAULT_LOG_FILTER);
        let moved = cfg.with_db_path("/tmp/other.sqlite3");
        assert_eq!(moved.db_path(), Path::new("/tmp/other.sqlite3"));
    }
}
