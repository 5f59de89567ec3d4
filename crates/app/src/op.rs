use std::error::Error;
use std::path::PathBuf;

use chunk_store::{BackendConfig, BinaryStoreError, ChunkedBlobStore};

use crate::state::{AppState, StateError};

/// Credentials supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct S3Credentials {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl S3Credentials {
    /// Replace the configured credentials of an S3 backend, if any were given.
    pub fn apply(&self, backend: &mut BackendConfig) {
        if let BackendConfig::S3(s3) = backend {
            if let Some(access_key) = &self.access_key {
                s3.access_key = access_key.clone();
            }
            if let Some(secret_key) = &self.secret_key {
                s3.secret_key = secret_key.clone();
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OpContextError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error("failed to open chunk store: {0}")]
    Store(#[from] BinaryStoreError),
}

#[derive(Debug, Clone)]
pub struct OpContext {
    /// Optional custom config path (defaults to ~/.chunkvault)
    pub config_path: Option<PathBuf>,
    /// Credential overrides for S3 backends
    pub credentials: S3Credentials,
}

impl OpContext {
    pub fn new(config_path: Option<PathBuf>, credentials: S3Credentials) -> Self {
        Self {
            config_path,
            credentials,
        }
    }

    pub fn state(&self) -> Result<AppState, StateError> {
        AppState::load(self.config_path.clone())
    }

    /// Load the config and open the store it describes.
    pub async fn store(&self) -> Result<ChunkedBlobStore, OpContextError> {
        let state = self.state()?;
        let mut backend = state.config.backend;
        self.credentials.apply(&mut backend);
        Ok(ChunkedBlobStore::open(&backend, state.config.store).await?)
    }
}

#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug)]
        pub enum OpOutput {
            $($variant(<$type as $crate::op::Op>::Output),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::op::Op for Command {
            type Output = OpOutput;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => {
                            op.execute(ctx).await
                                .map(OpOutput::$variant)
                                .map_err(OpError::$variant)
                        },
                    )*
                }
            }
        }

        impl std::fmt::Display for OpOutput {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        OpOutput::$variant(output) => write!(f, "{}", output),
                    )*
                }
            }
        }
    };
}
