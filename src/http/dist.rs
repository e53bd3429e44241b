//! Compiled-output serving below the dist prefix.
//!
//! Three kinds of request live under the prefix:
//! - `<prefix>data/<page>[@<search>]/data.js`: SSR data as an ES module
//! - `*.css`: stylesheets straight from the build directory
//! - everything else: modules and source maps from the `ModuleCache`
//!
//! A request none of these recognize yields `None` so the caller can fall
//! through to server-side rendering.

use axum::{
    body::Body,
    http::{header, HeaderMap, StatusCode},
    response::Response,
};

use crate::error::HandlerError;
use crate::http::response::{empty, CSS_UTF8, JAVASCRIPT_UTF8, JSON_UTF8};
use crate::modules::Conditional;
use crate::project::{Location, Project};
use crate::routing::path::{join_under, split_by};

const DATA_SUFFIX: &str = "/data.js";
const SOURCE_MAP_SUFFIX: &str = ".map";

/// Serve `pathname` from compiled output, if anything there answers it.
pub async fn serve_dist(
    project: &dyn Project,
    dist_prefix: &str,
    pathname: &str,
    headers: &HeaderMap,
) -> Result<Option<Response>, HandlerError> {
    if let Some(location) = data_location(dist_prefix, pathname) {
        return serve_data(project, &location).await.map(Some);
    }

    if pathname.ends_with(".css") {
        return serve_css(project, dist_prefix, pathname).await;
    }

    if pathname.ends_with(".js.map") {
        let module_path = pathname.strip_suffix(SOURCE_MAP_SUFFIX).unwrap_or(pathname);
        // existence only: source maps carry no ETag and never answer 304
        return match project.get_module_by_path(module_path) {
            Some(record) => Ok(Some(compiled_response(
                JSON_UTF8,
                None,
                record.js_source_map.clone(),
            )?)),
            None => Ok(None),
        };
    }

    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok());
    match project.modules().conditional_get(pathname, if_none_match) {
        Some(Conditional::NotModified) => Ok(Some(empty(StatusCode::NOT_MODIFIED))),
        Some(Conditional::Body(record)) => {
            let body = if project.is_hmrable(&record.id) {
                project.inject_hmr(&record)
            } else {
                record.js_content.clone()
            };
            Ok(Some(compiled_response(JAVASCRIPT_UTF8, Some(&record.hash), body)?))
        }
        None => Ok(None),
    }
}

/// `/_aleph/data/foo@bar/data.js` → `Location { "/foo", "bar" }`.
pub fn data_location(dist_prefix: &str, pathname: &str) -> Option<Location> {
    let data_prefix = format!("{}data", dist_prefix);
    if !pathname.starts_with(&format!("{}/", data_prefix)) || !pathname.ends_with(DATA_SUFFIX) {
        return None;
    }
    let inner = pathname
        .strip_prefix(data_prefix.as_str())
        .and_then(|p| p.strip_suffix(DATA_SUFFIX))
        .unwrap_or_default();
    let (page, search) = split_by(inner, '@');
    let page = if page.is_empty() { "/" } else { page };
    Some(Location::new(page, search))
}

async fn serve_data(project: &dyn Project, location: &Location) -> Result<Response, HandlerError> {
    let (status, data) = project.ssr_data(location).await?;
    if status != StatusCode::OK {
        return Ok(empty(status));
    }
    let body = format!("export default {}", serde_json::to_string(&data)?);
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, JAVASCRIPT_UTF8)
        .body(Body::from(body))?;
    Ok(response)
}

async fn serve_css(
    project: &dyn Project,
    dist_prefix: &str,
    pathname: &str,
) -> Result<Option<Response>, HandlerError> {
    let Some(build_dir) = project.build_dir() else {
        return Ok(None);
    };
    let relative = pathname.strip_prefix(dist_prefix).unwrap_or(pathname);
    let Some(path) = join_under(build_dir, relative) else {
        return Ok(None);
    };
    match tokio::fs::read(&path).await {
        Ok(body) => {
            let response = Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, CSS_UTF8)
                .body(Body::from(body))?;
            Ok(Some(response))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) if e.kind() == std::io::ErrorKind::IsADirectory => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn compiled_response(
    content_type: &'static str,
    etag: Option<&str>,
    body: String,
) -> Result<Response, HandlerError> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type);
    if let Some(etag) = etag {
        builder = builder.header(header::ETAG, etag);
    }
    let response = builder.body(Body::from(body))?;
    Ok(response)
}
