//! Request logging pipes.

use crate::http::request::RequestContext;
use crate::pipeline::pipe::Pipe;

/// Logs host, method and URL of every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLogger;

impl Pipe for RequestLogger {
    fn name(&self) -> &str {
        "logger"
    }

    fn handle(&self, request: &RequestContext) {
        tracing::info!(
            request_id = %request.request_id,
            host = request.header("host").unwrap_or("-"),
            method = %request.method,
            url = %request.uri,
            "Request"
        );
    }
}

/// Logs the names of the cookies a request carries. Values are never logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct CookieLogger;

impl Pipe for CookieLogger {
    fn name(&self) -> &str {
        "cookie_logger"
    }

    fn handle(&self, request: &RequestContext) {
        let names = cookie_names(request.header("cookie").unwrap_or_default());
        tracing::info!(request_id = %request.request_id, cookies = ?names, "Request cookies");
    }
}

fn cookie_names(header: &str) -> Vec<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.split('=').next())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}
