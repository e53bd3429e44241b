//! The `Pipe` capability and the ordered `Pipeline` that runs them.

use std::sync::Arc;

use crate::http::request::RequestContext;

/// A single middleware unit.
///
/// Any type implementing `handle` qualifies. Pipes run for their side
/// effects (logging, auditing) and cannot stop the chain.
pub trait Pipe: Send + Sync + std::fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Observe the request.
    fn handle(&self, request: &RequestContext);
}

/// An ordered sequence of pipes for one group.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    pipes: Vec<Arc<dyn Pipe>>,
}

impl Pipeline {
    pub fn new(pipes: Vec<Arc<dyn Pipe>>) -> Self {
        Self { pipes }
    }

    /// Append pipes after the existing ones.
    pub fn extend(&mut self, pipes: impl IntoIterator<Item = Arc<dyn Pipe>>) {
        self.pipes.extend(pipes);
    }

    /// Invoke every pipe in registration order.
    pub fn run(&self, request: &RequestContext) {
        for pipe in &self.pipes {
            tracing::trace!(pipe = pipe.name(), request_id = %request.request_id, "Running pipe");
            pipe.handle(request);
        }
    }

    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }

    /// Pipe names in execution order.
    pub fn names(&self) -> Vec<String> {
        self.pipes.iter().map(|p| p.name().to_string()).collect()
    }
}
