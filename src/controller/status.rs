//! Built-in status controller.

use async_trait::async_trait;
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::controller::{ApiRequest, Controller};
use crate::error::HandlerError;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct RequestEcho {
    pub request_id: String,
    pub method: String,
    pub pathname: String,
    pub search: String,
    pub body_bytes: usize,
}

/// Answers `show` with the server version and `echo` with what it received.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusController;

#[async_trait]
impl Controller for StatusController {
    fn name(&self) -> &str {
        "status"
    }

    async fn call(&self, action: &str, request: ApiRequest) -> Result<Response, HandlerError> {
        match action {
            "show" => Ok(Json(SystemStatus {
                version: env!("CARGO_PKG_VERSION"),
                status: "operational",
            })
            .into_response()),
            "echo" => {
                let ctx = request.context;
                Ok(Json(RequestEcho {
                    request_id: ctx.request_id,
                    method: ctx.method.to_string(),
                    pathname: ctx.pathname,
                    search: ctx.search,
                    body_bytes: request.body.len(),
                })
                .into_response())
            }
            other => Err(HandlerError::UnknownAction {
                controller: self.name().to_string(),
                action: other.to_string(),
                method: request.context.method,
            }),
        }
    }
}
