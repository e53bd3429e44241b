//! Pipes that can be named in `[pipelines]`.

use std::sync::Arc;

use crate::error::ConfigurationError;
use crate::pipeline::logger::{CookieLogger, RequestLogger};
use crate::pipeline::pipe::Pipe;

/// Names accepted in configuration.
pub const PIPE_NAMES: [&str; 2] = ["logger", "cookie_logger"];

/// Build the pipe registered under `name`.
pub fn pipe_from_name(name: &str) -> Result<Arc<dyn Pipe>, ConfigurationError> {
    match name {
        "logger" => Ok(Arc::new(RequestLogger)),
        "cookie_logger" => Ok(Arc::new(CookieLogger)),
        other => Err(ConfigurationError::UnknownPipe(other.to_string())),
    }
}

/// Build every pipe in `names`, failing on the first unknown one.
pub fn pipes_from_names(names: &[String]) -> Result<Vec<Arc<dyn Pipe>>, ConfigurationError> {
    names.iter().map(|n| pipe_from_name(n)).collect()
}
