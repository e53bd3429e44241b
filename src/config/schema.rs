//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from `tails.toml`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the application server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (host, port, port retry).
    pub listener: ListenerConfig,

    /// Where public assets and build output live.
    pub paths: PathsConfig,

    /// Reserved request prefixes.
    pub dispatch: DispatchConfig,

    /// Pipe names per pipeline group, in execution order.
    pub pipelines: BTreeMap<String, Vec<String>>,

    /// Controller routes declared in config.
    pub routes: Vec<RouteConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut pipelines = BTreeMap::new();
        pipelines.insert("web".to_string(), vec!["logger".to_string()]);
        pipelines.insert("api".to_string(), vec!["logger".to_string()]);

        Self {
            listener: ListenerConfig::default(),
            paths: PathsConfig::default(),
            dispatch: DispatchConfig::default(),
            pipelines,
            routes: Vec::new(),
            timeouts: TimeoutConfig::default(),
            limits: LimitsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host to bind (e.g., "127.0.0.1").
    pub host: String,

    /// First port to try.
    pub port: u16,

    /// How many consecutive ports to try when the port is taken.
    pub max_port_attempts: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_port_attempts: 100,
        }
    }
}

/// Filesystem layout, relative to the app root.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory served verbatim.
    pub public_dir: String,

    /// Build output of the bundler (compiled modules, css, pages, data).
    pub build_dir: String,

    /// Path prefix of the application, used in HMR update URLs.
    pub base_url: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            public_dir: "public".to_string(),
            build_dir: "dist".to_string(),
            base_url: "/".to_string(),
        }
    }
}

/// Reserved paths that decide the dispatch class.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// WebSocket upgrade path for HMR.
    pub hmr_path: String,

    /// Prefix routed to API controllers.
    pub api_prefix: String,

    /// Prefix of compiled output (modules, css, ssr data).
    pub dist_prefix: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            hmr_path: "/_hmr".to_string(),
            api_prefix: "/api/".to_string(),
            dist_prefix: "/_aleph/".to_string(),
        }
    }
}

/// A controller route declared in config.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Pipeline group the route belongs to.
    pub group: String,

    /// HTTP method (e.g., "GET").
    #[serde(default = "default_method")]
    pub method: String,

    /// Literal request path.
    pub path: String,

    /// Controller name from the controller catalog.
    pub controller: String,

    /// Method invoked on the controller.
    pub action: String,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty for development, json for log shipping.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
