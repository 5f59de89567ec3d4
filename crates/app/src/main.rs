// CLI modules
mod args;
mod logging;
mod op;
mod ops;
mod state;
mod version;

use std::str::FromStr;

use args::Args;
use clap::{Parser, Subcommand};
use op::{Op, OpContext, S3Credentials};
use ops::{Algorithms, Digest, Exists, Get, Init, NewId, Purge, Put, Size, Version};
use state::AppState;
use tracing::level_filters::LevelFilter;

command_enum! {
    (Algorithms, Algorithms),
    (Digest, Digest),
    (Exists, Exists),
    (Get, Get),
    (Init, Init),
    (NewId, NewId),
    (Purge, Purge),
    (Put, Put),
    (Size, Size),
    (Version, Version),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Flag > config file > warn. A missing config is reported by the op itself.
    let config = AppState::load(args.config_path.clone())
        .ok()
        .map(|state| state.config);
    let log_level = args
        .log_level
        .or_else(|| {
            config
                .as_ref()
                .and_then(|config| LevelFilter::from_str(&config.log_level).ok())
        })
        .unwrap_or(LevelFilter::WARN);
    let log_dir = config.as_ref().and_then(|config| config.log_dir.clone());
    let guards = logging::init_logging(log_level, log_dir.as_deref());

    let ctx = OpContext::new(
        args.config_path,
        S3Credentials {
            access_key: args.s3_access_key,
            secret_key: args.s3_secret_key,
        },
    );

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            let output = output.to_string();
            if !output.is_empty() {
                println!("{}", output);
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    // Flush the non-blocking writers before exiting.
    drop(guards);
    std::process::exit(code);
}
