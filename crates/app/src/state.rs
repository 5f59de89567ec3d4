use std::{fs, path::PathBuf};

use chunk_store::{BackendConfig, StoreConfig};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "chunkvault";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "chunks.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default log level (RUST_LOG still takes precedence)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for daily-rolling log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Chunking and consistency settings
    #[serde(default)]
    pub store: StoreConfig,
    /// Where chunk rows are kept
    #[serde(default)]
    pub backend: BackendConfig,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_dir: None,
            store: StoreConfig::default(),
            backend: BackendConfig::default(),
        }
    }
}

impl AppConfig {
    /// Default configuration for a fresh state directory: chunks in a SQLite
    /// file next to the config.
    pub fn for_dir(state_dir: &std::path::Path) -> Self {
        Self {
            backend: BackendConfig::Sqlite {
                path: state_dir.join(DB_FILE_NAME),
            },
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the state directory (~/.chunkvault)
    pub state_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the state directory path (custom or default ~/.chunkvault)
    pub fn state_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let state_dir = Self::state_dir(custom_path)?;

        let config_path = state_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&state_dir)?;

        let config = config.unwrap_or_else(|| AppConfig::for_dir(&state_dir));
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            state_dir,
            config_path,
            config,
        })
    }

    /// Load existing state from the state directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let state_dir = Self::state_dir(custom_path)?;

        let config_path = state_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            state_dir,
            config_path,
            config,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("chunkvault directory not initialized. Run 'chunkvault init' first")]
    NotInitialized,

    #[error("chunkvault directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
