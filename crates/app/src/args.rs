pub use clap::Parser;

use std::path::PathBuf;

use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "chunkvault")]
#[command(about = "Store and retrieve binaries as fixed-length chunks")]
#[command(version)]
pub struct Args {
    /// Path to the chunkvault config directory (defaults to ~/.chunkvault)
    #[arg(long, global = true, env = "CHUNKVAULT_CONFIG_PATH")]
    pub config_path: Option<PathBuf>,

    /// Log level (overrides the config file; RUST_LOG overrides both)
    #[arg(long, global = true)]
    pub log_level: Option<LevelFilter>,

    /// S3 access key, overriding the one in the config file
    #[arg(long, global = true, env = "CHUNKVAULT_S3_ACCESS_KEY", hide_env_values = true)]
    pub s3_access_key: Option<String>,

    /// S3 secret key, overriding the one in the config file
    #[arg(long, global = true, env = "CHUNKVAULT_S3_SECRET_KEY", hide_env_values = true)]
    pub s3_secret_key: Option<String>,

    #[command(subcommand)]
    pub command: crate::Command,
}
