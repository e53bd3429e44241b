//! Named pipeline groups.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ConfigurationError;
use crate::http::request::RequestContext;
use crate::pipeline::pipe::{Pipe, Pipeline};

/// Group name used for pages, static files and compiled modules.
pub const WEB_GROUP: &str = "web";
/// Group name used for API controllers.
pub const API_GROUP: &str = "api";

/// Map of group name → pipeline.
///
/// Mutated only while the `ServerConfig` is being built.
#[derive(Debug, Clone, Default)]
pub struct Pipelines {
    groups: HashMap<String, Pipeline>,
}

impl Pipelines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure a group exists, without adding pipes.
    pub fn declare(&mut self, group: &str) {
        self.groups.entry(group.to_string()).or_default();
    }

    /// Append `pipes` to `group`, declaring it if needed.
    pub fn register(&mut self, group: &str, pipes: Vec<Arc<dyn Pipe>>) {
        let pipeline = self.groups.entry(group.to_string()).or_default();
        pipeline.extend(pipes);
        tracing::debug!(group = %group, pipes = ?pipeline.names(), "Pipeline registered");
    }

    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    pub fn get(&self, group: &str) -> Option<&Pipeline> {
        self.groups.get(group)
    }

    /// Run every pipe of `group` against the request.
    pub fn run(&self, group: &str, request: &RequestContext) -> Result<(), ConfigurationError> {
        let pipeline = self
            .groups
            .get(group)
            .ok_or_else(|| ConfigurationError::UnknownGroup(group.to_string()))?;
        pipeline.run(request);
        Ok(())
    }

    /// Declared group names, sorted.
    pub fn groups(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.groups.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::pipe::tests::{context, RecordingPipe};
    use std::sync::Mutex;

    fn recording(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> Arc<dyn Pipe> {
        Arc::new(RecordingPipe { name, log: log.clone() })
    }

    #[test]
    fn test_later_registration_appends() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipelines = Pipelines::new();
        pipelines.register(WEB_GROUP, vec![recording("a", &log)]);
        pipelines.register(WEB_GROUP, vec![recording("b", &log), recording("c", &log)]);

        pipelines.run(WEB_GROUP, &context("/")).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_groups_are_isolated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipelines = Pipelines::new();
        pipelines.register(WEB_GROUP, vec![recording("web", &log)]);
        pipelines.register(API_GROUP, vec![recording("api", &log)]);

        pipelines.run(API_GROUP, &context("/api/x")).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["api"]);
    }

    #[test]
    fn test_unknown_group_is_configuration_error() {
        let pipelines = Pipelines::new();
        let err = pipelines.run("admin", &context("/")).unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownGroup("admin".into()));
    }

    #[test]
    fn test_declare_keeps_existing_pipes() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipelines = Pipelines::new();
        pipelines.register("static", vec![recording("a", &log)]);
        pipelines.declare("static");
        assert_eq!(pipelines.get("static").unwrap().len(), 1);
        assert_eq!(pipelines.groups(), vec!["static"]);
    }
}
