//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Register pipelines and routes, then freeze them
//! - Index the build output and, in dev mode, watch it
//! - Bind the listener (moving past busy ports) and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: every error here ends the process
//! - The listener binds last so traffic only arrives once the project is ready

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::config::loader::{load_app_config, load_config, ConfigError};
use crate::config::ServerConfigBuilder;
use crate::controller::ControllerRegistry;
use crate::error::{ConfigurationError, ListenError};
use crate::http::HttpServer;
use crate::lifecycle::signals;
use crate::net::listener;
use crate::observability::{logging, metrics};
use crate::project::watcher::BuildWatcher;
use crate::project::DiskProject;

/// Fatal startup or serve failure.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("registration: {0}")]
    Registration(#[from] ConfigurationError),

    #[error("loading build output: {0}")]
    Project(#[source] std::io::Error),

    #[error("watching build output: {0}")]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    Listen(#[from] ListenError),

    #[error("server: {0}")]
    Serve(#[source] std::io::Error),
}

/// How to start the server.
#[derive(Debug, Clone)]
pub struct StartOptions {
    pub app_root: PathBuf,
    /// Overrides `listener.port` from the config file.
    pub port: Option<u16>,
    pub is_dev: bool,
    /// Rehash every module instead of trusting `manifest.json`.
    pub force_reload: bool,
    /// Explicit config file instead of looking in the app root.
    pub config_path: Option<PathBuf>,
}

impl StartOptions {
    pub fn new(app_root: impl Into<PathBuf>) -> Self {
        Self {
            app_root: app_root.into(),
            port: None,
            is_dev: false,
            force_reload: false,
            config_path: None,
        }
    }
}

/// Serve the app at `app_root` until a termination signal arrives.
pub async fn start(
    app_root: impl Into<PathBuf>,
    port: Option<u16>,
    is_dev: bool,
    force_reload: bool,
) -> Result<(), StartError> {
    let options = StartOptions {
        port,
        is_dev,
        force_reload,
        ..StartOptions::new(app_root)
    };
    start_with(options).await
}

pub async fn start_with(options: StartOptions) -> Result<(), StartError> {
    let app_root = options.app_root;
    let settings = match &options.config_path {
        Some(path) => load_config(path)?,
        None => load_app_config(&app_root)?,
    };

    logging::init(
        &settings.observability.log_level,
        settings.observability.log_format,
    );
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        app_root = %app_root.display(),
        dev = options.is_dev,
        "tails starting"
    );

    if settings.observability.metrics_enabled {
        match settings.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let config = ServerConfigBuilder::from_settings(&app_root, settings, &ControllerRegistry::with_builtins())?
        .dev_mode(options.is_dev)
        .build();
    let config = Arc::new(config);

    let build_dir = config.build_dir();
    if options.is_dev {
        tokio::fs::create_dir_all(&build_dir)
            .await
            .map_err(StartError::Project)?;
    }
    let project = DiskProject::new(&build_dir, &config.settings().dispatch.dist_prefix, options.is_dev)
        .load(options.force_reload)
        .await
        .map_err(StartError::Project)?;

    // dropping the watcher stops it, so it lives until serve returns
    let _build_watcher = if options.is_dev {
        Some(BuildWatcher::new(project.indexer().clone()).run()?)
    } else {
        None
    };

    let listener = listener::bind(&config.settings().listener, options.port).await?;

    let server = HttpServer::new(Arc::clone(&config), Arc::new(project));
    tokio::spawn(signals::shutdown_on_signal(server.shutdown_handle()));
    server.run(listener).await.map_err(StartError::Serve)?;

    tracing::info!("Shutdown complete");
    Ok(())
}
