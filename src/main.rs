//! tails command line.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use tails_server::config::schema::LogFormat;
use tails_server::lifecycle::startup::{start_with, StartOptions};
use tails_server::observability::logging;

/// Serve a compiled web app with live module reload.
#[derive(Debug, Parser)]
#[command(name = "tails", version, about)]
struct Cli {
    /// Application root directory.
    #[arg(default_value = ".")]
    app_dir: PathBuf,

    /// Port to listen on; overrides the config file.
    #[arg(short, long)]
    port: Option<u16>,

    /// Development mode: watch the build output and enable HMR injection.
    #[arg(long)]
    dev: bool,

    /// Ignore manifest.json and rehash every module.
    #[arg(long)]
    reload: bool,

    /// Config file to use instead of the app root's tails.toml.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let options = StartOptions {
        port: cli.port,
        is_dev: cli.dev,
        force_reload: cli.reload,
        config_path: cli.config,
        ..StartOptions::new(cli.app_dir)
    };

    match start_with(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // startup may fail before the configured subscriber is installed
            logging::init("info", LogFormat::Pretty);
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
