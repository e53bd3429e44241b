//! Response construction.
//!
//! # Responsibilities
//! - Render the HTML shell used by error and fallback pages
//! - Render the fixed 500 page for handler failures and panics
//! - Pick `Content-Type` values, adding `charset=utf-8` to textual types
//!
//! # Design Decisions
//! - Error messages are HTML-escaped before they are placed in the page
//! - The 500 page never depends on the project; it must render even when
//!   the project is the thing that failed

use std::any::Any;
use std::path::Path;

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::HandlerError;
use crate::observability::metrics;

pub const HTML_UTF8: &str = "text/html; charset=utf-8";
pub const JAVASCRIPT_UTF8: &str = "application/javascript; charset=utf-8";
pub const JSON_UTF8: &str = "application/json; charset=utf-8";
pub const CSS_UTF8: &str = "text/css; charset=utf-8";

/// Minimal HTML document.
pub fn create_html(lang: &str, head: &[&str], body: &str) -> String {
    let mut html = String::with_capacity(256 + body.len());
    html.push_str("<!DOCTYPE html>\n");
    html.push_str(&format!("<html lang=\"{}\">\n", escape_html(lang)));
    html.push_str("<head>\n<meta charset=\"utf-8\">\n");
    for tag in head {
        html.push_str(tag);
        html.push('\n');
    }
    html.push_str("</head>\n<body>\n");
    html.push_str(body);
    html.push_str("\n</body>\n</html>\n");
    html
}

/// Escape text for use inside HTML elements and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// The 500 page with `message` shown to the client.
pub fn internal_error_page(message: &str) -> Response {
    let html = create_html(
        "en",
        &["<title>500 - internal server error</title>"],
        &format!(
            "<p><strong><code>500</code></strong><small> - </small><span>{}</span></p>",
            escape_html(message)
        ),
    );
    html_response(StatusCode::INTERNAL_SERVER_ERROR, html)
}

/// Render a handler failure. This is the only place a `HandlerError`
/// becomes a response.
pub fn error_response(error: &HandlerError, request_id: &str) -> Response {
    tracing::error!(
        request_id = %request_id,
        code = error.error_code(),
        error = %error,
        "Request handler failed"
    );
    metrics::record_handler_error(error.error_code());
    internal_error_page(&error.to_string())
}

/// `CatchPanicLayer` hook: a panicking handler gets the same 500 page.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %message, "Request handler panicked");
    metrics::record_handler_error("panic");
    internal_error_page(&message)
}

pub fn html_response(status: StatusCode, html: String) -> Response {
    (status, [(header::CONTENT_TYPE, HTML_UTF8)], html).into_response()
}

/// Status-only response with an empty body.
pub fn empty(status: StatusCode) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

/// Content type for a file, guessed from its extension.
pub fn content_type_for(path: &Path) -> HeaderValue {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let value = if is_textual(mime.type_().as_str(), mime.subtype().as_str()) {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.essence_str().to_string()
    };
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}

fn is_textual(kind: &str, subtype: &str) -> bool {
    kind == "text" || matches!(subtype, "javascript" | "json" | "xml" | "svg+xml" | "manifest+json")
}
