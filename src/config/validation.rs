//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reserved paths must be absolute and prefixes must end in a slash
//! - The HMR path is matched exactly, so it must not end in a slash
//! - Routes must name a parseable HTTP method and an absolute path
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Group and controller names are checked later, when the
//!   `ServerConfig` is built, because the catalogs live in code

use axum::http::Method;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must start with '/' (got '{value}')")]
    NotAbsolute { field: &'static str, value: String },

    #[error("{field} must end with '/' (got '{value}')")]
    MissingTrailingSlash { field: &'static str, value: String },

    #[error("{field} must not end with '/' (got '{value}')")]
    UnexpectedTrailingSlash { field: &'static str, value: String },

    #[error("route {path}: invalid method '{method}'")]
    InvalidMethod { path: String, method: String },

    #[error("route {0}: path must start with '/'")]
    InvalidRoutePath(String),

    #[error("listener.max_port_attempts must be at least 1")]
    NoPortAttempts,

    #[error("limits.max_body_size must be greater than 0")]
    ZeroBodyLimit,

    #[error("timeouts.request_secs must be greater than 0")]
    ZeroTimeout,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_exact(&mut errors, "dispatch.hmr_path", &config.dispatch.hmr_path);
    check_prefix(&mut errors, "dispatch.api_prefix", &config.dispatch.api_prefix);
    check_prefix(&mut errors, "dispatch.dist_prefix", &config.dispatch.dist_prefix);
    check_absolute(&mut errors, "paths.base_url", &config.paths.base_url);

    for route in &config.routes {
        if route.method.parse::<Method>().is_err() {
            errors.push(ValidationError::InvalidMethod {
                path: route.path.clone(),
                method: route.method.clone(),
            });
        }
        if !route.path.starts_with('/') {
            errors.push(ValidationError::InvalidRoutePath(route.path.clone()));
        }
    }

    if config.listener.max_port_attempts == 0 {
        errors.push(ValidationError::NoPortAttempts);
    }
    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_absolute(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.starts_with('/') {
        errors.push(ValidationError::NotAbsolute {
            field,
            value: value.to_string(),
        });
    }
}

fn check_exact(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    check_absolute(errors, field, value);
    if value.len() > 1 && value.ends_with('/') {
        errors.push(ValidationError::UnexpectedTrailingSlash {
            field,
            value: value.to_string(),
        });
    }
}

fn check_prefix(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    check_absolute(errors, field, value);
    if !value.ends_with('/') {
        errors.push(ValidationError::MissingTrailingSlash {
            field,
            value: value.to_string(),
        });
    }
}
