//! Public-file serving.
//!
//! Conditional requests compare the file's modification time, rendered as
//! an HTTP-date, with `If-Modified-Since` by exact string equality.

use std::path::Path;
use std::time::SystemTime;

use axum::{
    body::Body,
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use chrono::{DateTime, Utc};

use crate::error::HandlerError;
use crate::http::response::{content_type_for, empty};

/// `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Serve `path`, or 304 when the client's copy is current.
pub async fn serve_file(path: &Path, headers: &HeaderMap) -> Result<Response, HandlerError> {
    let meta = tokio::fs::metadata(path).await?;
    let last_modified = http_date(meta.modified().unwrap_or_else(|_| SystemTime::now()));

    let if_modified_since = headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok());
    if if_modified_since == Some(last_modified.as_str()) {
        return Ok(empty(StatusCode::NOT_MODIFIED));
    }

    let body = tokio::fs::read(path).await?;
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(path))
        .header(header::LAST_MODIFIED, last_modified)
        .body(Body::from(body))?;
    Ok(response)
}
