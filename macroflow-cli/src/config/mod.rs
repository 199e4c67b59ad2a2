//! Configuration
//!
//! Resolution order, later entries winning:
//! 1. built-in defaults
//! 2. `config.toml` in the platform config directory (or `--config`)
//! 3. `MACROFLOW_*` environment variables (a `.env` file is loaded first)
//! 4. command-line flags

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const ENV_DATABASE_URL: &str = "MACROFLOW_DATABASE_URL";
pub const ENV_WORKBOOK: &str = "MACROFLOW_WORKBOOK";
pub const ENV_CREATOR_EMAIL: &str = "MACROFLOW_CREATOR_EMAIL";

const DEFAULT_WORKBOOK: &str = "resources/MACRO PROCESSUS NETWORKS & IS (MAJ).xlsx";
const DEFAULT_CREATOR_EMAIL: &str = "admin@k-j.store";
const APP_DIR: &str = "macroflow";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workbook imported when no path is given on the command line
    pub workbook: PathBuf,
    /// sqlx connection string of the document store
    pub database_url: String,
    /// Email of the user recorded as creator of imported records
    pub creator_email: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workbook: PathBuf::from(DEFAULT_WORKBOOK),
            database_url: default_database_url(),
            creator_email: DEFAULT_CREATOR_EMAIL.to_string(),
        }
    }
}

/// `sqlite://<data dir>/macroflow/macroflow.db`, or a file in the working directory
fn default_database_url() -> String {
    match dirs::data_dir() {
        Some(dir) => format!(
            "sqlite://{}",
            dir.join(APP_DIR).join("macroflow.db").display()
        ),
        None => "sqlite://macroflow.db".to_string(),
    }
}

/// Default location of the config file
pub fn config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("No config directory")?;
    Ok(dir.join(APP_DIR).join("config.toml"))
}

impl Config {
    /// Parse a config file
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML")
    }

    /// Load from an explicit path (which must exist) or the default path (which may not)
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file does not exist: {}", path.display());
                }
                path.to_path_buf()
            }
            None => {
                let path = config_path()?;
                if !path.exists() {
                    log::debug!("No config file at {}, using defaults", path.display());
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process environment)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_DATABASE_URL) {
            self.database_url = url;
        }
        if let Some(path) = lookup(ENV_WORKBOOK) {
            self.workbook = PathBuf::from(path);
        }
        if let Some(email) = lookup(ENV_CREATOR_EMAIL) {
            self.creator_email = email;
        }
    }

    /// Apply overrides from the process environment
    pub fn apply_process_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
    }
}
