use std::path::PathBuf;

use chunk_store::{BackendConfig, ChunkLength, S3Config, StoreConfig};
use clap::{Args, ValueEnum};

use crate::state::{AppConfig, AppState};

/// Backend type for CLI selection
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum BackendType {
    /// SQLite database file in the state directory (default)
    #[default]
    Sqlite,
    /// One object per chunk on the local filesystem
    Local,
    /// One object per chunk in S3-compatible storage
    S3,
    /// In-memory SQLite, discarded after every command
    Memory,
}

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Backend type
    #[arg(long, value_enum, default_value_t = BackendType::Sqlite)]
    pub backend: BackendType,

    /// Storage path for the sqlite and local backends (defaults inside the state directory)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Default chunk length in bytes
    #[arg(long)]
    pub chunk_length: Option<ChunkLength>,

    /// Prefix for generated identifiers
    #[arg(long)]
    pub identifier_prefix: Option<String>,

    /// S3 endpoint URL (required for --backend s3)
    #[arg(long)]
    pub s3_endpoint: Option<String>,

    /// S3 bucket name (required for --backend s3)
    #[arg(long)]
    pub s3_bucket: Option<String>,

    /// S3 region (optional, defaults to us-east-1)
    #[arg(long)]
    pub s3_region: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),

    #[error("missing required S3 configuration: {0}")]
    MissingS3Config(String),
}

impl Init {
    fn backend_config(
        &self,
        state_dir: &std::path::Path,
        ctx: &crate::op::OpContext,
    ) -> Result<BackendConfig, InitError> {
        match self.backend {
            BackendType::Sqlite => Ok(BackendConfig::Sqlite {
                path: self
                    .path
                    .clone()
                    .unwrap_or_else(|| state_dir.join(crate::state::DB_FILE_NAME)),
            }),

            BackendType::Local => Ok(BackendConfig::Local {
                path: self
                    .path
                    .clone()
                    .unwrap_or_else(|| state_dir.join("chunks")),
            }),

            BackendType::Memory => Ok(BackendConfig::Memory),

            BackendType::S3 => {
                let endpoint = self
                    .s3_endpoint
                    .clone()
                    .ok_or_else(|| InitError::MissingS3Config("--s3-endpoint".to_string()))?;
                let bucket = self
                    .s3_bucket
                    .clone()
                    .ok_or_else(|| InitError::MissingS3Config("--s3-bucket".to_string()))?;
                let access_key = ctx.credentials.access_key.clone().ok_or_else(|| {
                    InitError::MissingS3Config(
                        "--s3-access-key or CHUNKVAULT_S3_ACCESS_KEY".to_string(),
                    )
                })?;
                let secret_key = ctx.credentials.secret_key.clone().ok_or_else(|| {
                    InitError::MissingS3Config(
                        "--s3-secret-key or CHUNKVAULT_S3_SECRET_KEY".to_string(),
                    )
                })?;

                Ok(BackendConfig::S3(S3Config {
                    endpoint,
                    access_key,
                    secret_key,
                    bucket,
                    region: self.s3_region.clone(),
                }))
            }
        }
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state_dir = AppState::state_dir(ctx.config_path.clone())?;

        let mut store = StoreConfig::default();
        if let Some(chunk_length) = self.chunk_length {
            store.chunk_length = chunk_length;
        }
        if let Some(prefix) = &self.identifier_prefix {
            store.identifier_prefix = prefix.clone();
        }

        let config = AppConfig {
            store,
            backend: self.backend_config(&state_dir, ctx)?,
            ..AppConfig::default()
        };

        let state = AppState::init(Some(state_dir), Some(config))?;

        let output = format!(
            "Initialized chunkvault directory at: {}\n\
             - Config: {}\n\
             - Backend: {}\n\
             - Chunk length: {} bytes",
            state.state_dir.display(),
            state.config_path.display(),
            state.config.backend.kind(),
            state.config.store.chunk_length,
        );

        Ok(output)
    }
}
