use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_ENV: &str = "TASKDASH_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "taskdash.json";
const MAX_COLUMNS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Start with the sample tasks instead of an empty board.
    #[serde(default = "default_true")]
    pub seed_demo_tasks: bool,
    /// Where tracing output goes. The terminal is taken by the board, so
    /// without this nothing is logged.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default = "default_columns")]
    pub columns: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed_demo_tasks: default_true(),
            log_file: None,
            columns: default_columns(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_columns() -> usize {
    3
}

impl Config {
    /// `$TASKDASH_CONFIG` if set, else `./taskdash.json` if present, else defaults.
    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.columns = config.columns.clamp(1, MAX_COLUMNS);
        Ok(config)
    }
}
