//! The frozen server configuration.
//!
//! `ServerConfig` bundles the file settings with the pipeline and route
//! registries. It is built once by `ServerConfigBuilder` during startup and
//! then shared read-only through an `Arc`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::http::Method;

use crate::config::schema::AppConfig;
use crate::controller::{Controller, ControllerRegistry};
use crate::error::ConfigurationError;
use crate::pipeline::catalog::pipes_from_names;
use crate::pipeline::registry::{API_GROUP, WEB_GROUP};
use crate::pipeline::{Pipe, Pipelines};
use crate::routing::{RouteEntry, RouteTable, Router};

/// Everything the request path needs, immutable once built.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    app_root: PathBuf,
    settings: AppConfig,
    pipelines: Pipelines,
    routes: RouteTable,
    is_dev: bool,
}

impl ServerConfig {
    pub fn app_root(&self) -> &Path {
        &self.app_root
    }

    pub fn settings(&self) -> &AppConfig {
        &self.settings
    }

    pub fn pipelines(&self) -> &Pipelines {
        &self.pipelines
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn is_dev(&self) -> bool {
        self.is_dev
    }

    pub fn public_dir(&self) -> PathBuf {
        self.app_root.join(&self.settings.paths.public_dir)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.app_root.join(&self.settings.paths.build_dir)
    }

    /// The dispatch router for this configuration.
    pub fn router(&self) -> Router {
        Router::new(self.public_dir(), &self.settings.dispatch)
    }
}

/// Registration-phase view of a `ServerConfig`.
#[derive(Debug)]
pub struct ServerConfigBuilder {
    app_root: PathBuf,
    settings: AppConfig,
    pipelines: Pipelines,
    routes: RouteTable,
    is_dev: bool,
}

impl ServerConfigBuilder {
    /// Start a builder. The "web" and "api" groups always exist.
    pub fn new(app_root: impl Into<PathBuf>, settings: AppConfig) -> Self {
        let mut builder = Self {
            app_root: app_root.into(),
            settings,
            pipelines: Pipelines::new(),
            routes: RouteTable::new(),
            is_dev: false,
        };
        builder.declare(WEB_GROUP);
        builder.declare(API_GROUP);
        builder
    }

    /// Builder with `[pipelines]` and `[[routes]]` from the settings applied.
    pub fn from_settings(
        app_root: impl Into<PathBuf>,
        settings: AppConfig,
        controllers: &ControllerRegistry,
    ) -> Result<Self, ConfigurationError> {
        let pipelines = settings.pipelines.clone();
        let routes = settings.routes.clone();
        let mut builder = Self::new(app_root, settings);

        for (group, names) in &pipelines {
            let pipes = pipes_from_names(names)?;
            builder.pipeline(group, pipes);
        }

        for route in &routes {
            let method: Method = route
                .method
                .parse()
                .map_err(|_| ConfigurationError::InvalidMethod(route.method.clone()))?;
            let controller = controllers.get(&route.controller)?;
            builder.routes(&route.group, |scope| {
                scope.route(method, &route.path, controller, &route.action);
            })?;
        }

        Ok(builder)
    }

    pub fn dev_mode(mut self, is_dev: bool) -> Self {
        self.is_dev = is_dev;
        self
    }

    fn declare(&mut self, group: &str) {
        self.pipelines.declare(group);
        self.routes.declare_group(group);
    }

    /// Declare `group` and append `pipes` to its pipeline.
    pub fn pipeline(&mut self, group: &str, pipes: Vec<Arc<dyn Pipe>>) -> &mut Self {
        self.declare(group);
        self.pipelines.register(group, pipes);
        self
    }

    /// Add routes to an already declared group.
    pub fn routes<F>(&mut self, group: &str, f: F) -> Result<&mut Self, ConfigurationError>
    where
        F: FnOnce(&mut RouteScope<'_>),
    {
        if !self.routes.has_group(group) {
            return Err(ConfigurationError::UnknownGroup(group.to_string()));
        }
        let mut scope = RouteScope {
            table: &mut self.routes,
            group: group.to_string(),
        };
        f(&mut scope);
        Ok(self)
    }

    pub fn build(self) -> ServerConfig {
        tracing::info!(
            groups = ?self.pipelines.groups(),
            routes = self.routes.len(),
            dev = self.is_dev,
            "Server configuration frozen"
        );
        ServerConfig {
            app_root: self.app_root,
            settings: self.settings,
            pipelines: self.pipelines,
            routes: self.routes,
            is_dev: self.is_dev,
        }
    }
}

/// Route registration inside one group.
pub struct RouteScope<'a> {
    table: &'a mut RouteTable,
    group: String,
}

impl RouteScope<'_> {
    pub fn route(
        &mut self,
        method: Method,
        path: &str,
        controller: Arc<dyn Controller>,
        action: &str,
    ) -> &mut Self {
        // the group was checked when the scope was opened
        if let Err(e) = self
            .table
            .add_route(&self.group, method, path, RouteEntry::new(controller, action))
        {
            tracing::error!(error = %e, "Route registration failed");
        }
        self
    }

    pub fn get(&mut self, path: &str, controller: Arc<dyn Controller>, action: &str) -> &mut Self {
        self.route(Method::GET, path, controller, action)
    }

    pub fn post(&mut self, path: &str, controller: Arc<dyn Controller>, action: &str) -> &mut Self {
        self.route(Method::POST, path, controller, action)
    }

    pub fn put(&mut self, path: &str, controller: Arc<dyn Controller>, action: &str) -> &mut Self {
        self.route(Method::PUT, path, controller, action)
    }

    pub fn patch(&mut self, path: &str, controller: Arc<dyn Controller>, action: &str) -> &mut Self {
        self.route(Method::PATCH, path, controller, action)
    }

    pub fn delete(&mut self, path: &str, controller: Arc<dyn Controller>, action: &str) -> &mut Self {
        self.route(Method::DELETE, path, controller, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;
    use crate::controller::StatusController;
    use crate::pipeline::logger::RequestLogger;

    #[test]
    fn test_default_groups_exist() {
        let config = ServerConfigBuilder::new("/app", AppConfig::default()).build();
        assert!(config.pipelines().contains("web"));
        assert!(config.pipelines().contains("api"));
        assert!(config.routes().has_group("api"));
    }

    #[test]
    fn test_routes_into_undeclared_group_fail() {
        let mut builder = ServerConfigBuilder::new("/app", AppConfig::default());
        let err = builder
            .routes("admin", |r| {
                r.get("/admin", Arc::new(StatusController), "show");
            })
            .unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownGroup("admin".into()));
    }

    #[test]
    fn test_pipeline_declares_group_for_routes() {
        let mut builder = ServerConfigBuilder::new("/app", AppConfig::default());
        builder.pipeline("static", vec![Arc::new(RequestLogger)]);
        builder
            .routes("static", |r| {
                r.get("/robots", Arc::new(StatusController), "show")
                    .post("/robots", Arc::new(StatusController), "echo");
            })
            .unwrap();
        let config = builder.build();
        assert_eq!(config.routes().len(), 2);
        assert_eq!(config.pipelines().get("static").unwrap().names(), vec!["logger"]);
    }

    #[test]
    fn test_from_settings_applies_pipelines_and_routes() {
        let mut settings = AppConfig::default();
        settings.pipelines.insert("web".into(), vec!["logger".into(), "cookie_logger".into()]);
        settings.routes.push(RouteConfig {
            group: "api".into(),
            method: "GET".into(),
            path: "/api/status".into(),
            controller: "status".into(),
            action: "show".into(),
        });

        let config = ServerConfigBuilder::from_settings("/app", settings, &ControllerRegistry::with_builtins())
            .unwrap()
            .dev_mode(true)
            .build();

        assert!(config.is_dev());
        assert_eq!(
            config.pipelines().get("web").unwrap().names(),
            vec!["logger", "cookie_logger"]
        );
        assert!(config.routes().lookup("api", &Method::GET, "/api/status").is_some());
        assert_eq!(config.public_dir(), PathBuf::from("/app/public"));
    }

    #[test]
    fn test_from_settings_rejects_unknown_group() {
        let mut settings = AppConfig::default();
        settings.routes.push(RouteConfig {
            group: "admin".into(),
            method: "GET".into(),
            path: "/admin".into(),
            controller: "status".into(),
            action: "show".into(),
        });

        let err = ServerConfigBuilder::from_settings("/app", settings, &ControllerRegistry::with_builtins())
            .unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownGroup("admin".into()));
    }
}
