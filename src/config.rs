//! Layered settings: TOML file, then `CALCI_*` environment variables, then
//! command-line flags (applied by the caller).
//!
//! ```toml
//! results_dir = "results"
//! history_file = "history.json"
//! export_files = true
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "calci.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the ledger and exported files.
    pub results_dir: PathBuf,
    pub history_file: String,
    /// Write CSV and markdown exports after a semester or CGPA computation.
    pub export_files: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
            history_file: "history.json".to_string(),
            export_files: true,
        }
    }
}

impl AppConfig {
    /// Loads `explicit` if given, otherwise `calci.toml` when it exists, then
    /// applies environment overrides.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(dir) = lookup("CALCI_RESULTS_DIR") {
            self.results_dir = PathBuf::from(dir);
        }
        if let Some(file) = lookup("CALCI_HISTORY_FILE") {
            self.history_file = file;
        }
        if let Some(flag) = lookup("CALCI_EXPORT_FILES") {
            self.export_files = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => anyhow::bail!("CALCI_EXPORT_FILES must be true or false, got '{other}'"),
            };
        }
        Ok(())
    }

    pub fn history_path(&self) -> PathBuf {
        self.results_dir.join(&self.history_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_point_at_results_dir() {
        let config = AppConfig::default();
        assert_eq!(config.history_path(), PathBuf::from("results").join("history.json"));
        assert!(config.export_files);
    }

    #[test]
    fn file_values_fill_missing_keys_with_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("calci.toml");
        std::fs::write(&path, "results_dir = \"/srv/calci\"\nexport_files = false\n").expect("write");

        let config = AppConfig::from_file(&path).expect("valid config");
        assert_eq!(config.results_dir, PathBuf::from("/srv/calci"));
        assert_eq!(config.history_file, "history.json");
        assert!(!config.export_files);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("calci.toml");
        std::fs::write(&path, "results_dir = [").expect("write");
        assert!(AppConfig::from_file(&path).is_err());
    }

    #[test]
    fn environment_overrides_file() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("CALCI_RESULTS_DIR", "/tmp/grades"),
            ("CALCI_EXPORT_FILES", "0"),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .expect("valid env");
        assert_eq!(config.results_dir, PathBuf::from("/tmp/grades"));
        assert!(!config.export_files);
        assert_eq!(config.history_file, "history.json");
    }

    #[test]
    fn rejects_unparseable_export_flag() {
        let mut config = AppConfig::default();
        let result = config.apply_env(|key| (key == "CALCI_EXPORT_FILES").then(|| "maybe".to_string()));
        assert!(result.is_err());
    }
}
