//! Controller dispatch.
//!
//! # Data Flow
//! ```text
//! DispatchDecision::Api(pathname)
//!     → RouteTable lookup ("api" group, method, pathname)
//!     → Dispatch::dispatch(Option<&RouteEntry>, ApiRequest)
//!         Some(entry) → entry.controller.call(entry.action, request)
//!         None        → not-found response decided here
//! ```
//!
//! # Design Decisions
//! - A missing route is not a routing failure; the dispatcher owns the 404
//! - Controllers are referenced by `Arc<dyn Controller>` and resolve their
//!   own action names
//! - Controllers named in config come from a fixed catalog

pub mod status;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;

use crate::error::{ConfigurationError, HandlerError};
use crate::http::request::RequestContext;
use crate::routing::RouteEntry;

pub use status::StatusController;

/// An API request handed to a controller.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub context: RequestContext,
    pub body: Bytes,
}

/// A controller exposing named actions.
#[async_trait]
pub trait Controller: Send + Sync {
    /// Name used in logs and in config.
    fn name(&self) -> &str;

    /// Run `action` for the request.
    async fn call(&self, action: &str, request: ApiRequest) -> Result<Response, HandlerError>;
}

/// Decides what an API request turns into, given the route lookup result.
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch(
        &self,
        target: Option<&RouteEntry>,
        request: ApiRequest,
    ) -> Result<Response, HandlerError>;
}

/// Default dispatcher: call the routed controller, or answer 404 JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct RouteDispatcher;

#[async_trait]
impl Dispatch for RouteDispatcher {
    async fn dispatch(
        &self,
        target: Option<&RouteEntry>,
        request: ApiRequest,
    ) -> Result<Response, HandlerError> {
        match target {
            Some(entry) => {
                tracing::debug!(
                    request_id = %request.context.request_id,
                    controller = entry.controller.name(),
                    action = %entry.action,
                    "Dispatching to controller"
                );
                entry.controller.call(&entry.action, request).await
            }
            None => {
                tracing::debug!(
                    request_id = %request.context.request_id,
                    method = %request.context.method,
                    path = %request.context.pathname,
                    "No API route matched"
                );
                Ok(not_found(&request.context.pathname))
            }
        }
    }
}

/// JSON 404 body for API requests.
pub fn not_found(pathname: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "status": 404,
            "message": format!("no route for {}", pathname),
        })),
    )
        .into_response()
}

/// Controllers that routes in config may reference by name.
#[derive(Clone, Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, Arc<dyn Controller>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in controllers.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(StatusController));
        registry
    }

    pub fn register(&mut self, controller: Arc<dyn Controller>) {
        self.controllers
            .insert(controller.name().to_string(), controller);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Controller>, ConfigurationError> {
        self.controllers
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownController(name.to_string()))
    }
}

impl std::fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.controllers.keys().collect();
        names.sort();
        f.debug_struct("ControllerRegistry").field("controllers", &names).finish()
    }
}
