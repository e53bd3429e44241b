//! Route lookup.
//!
//! # Responsibilities
//! - Store controller targets per (group, method, literal path)
//! - Refuse routes for groups no pipeline declared
//! - Exact-path lookup on normalized paths
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) lookup via nested HashMaps
//! - Re-registering a triple overwrites silently (last wins)

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;

use crate::controller::Controller;
use crate::error::ConfigurationError;
use crate::routing::path::normalize;

/// Target of a route: a controller and the action to call on it.
#[derive(Clone)]
pub struct RouteEntry {
    pub controller: Arc<dyn Controller>,
    pub action: String,
}

impl RouteEntry {
    pub fn new(controller: Arc<dyn Controller>, action: impl Into<String>) -> Self {
        Self {
            controller,
            action: action.into(),
        }
    }
}

impl std::fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteEntry")
            .field("controller", &self.controller.name())
            .field("action", &self.action)
            .finish()
    }
}

type Paths = HashMap<String, RouteEntry>;

/// group → method → path → target.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    groups: HashMap<String, HashMap<Method, Paths>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow routes to be added to `group`.
    pub fn declare_group(&mut self, group: &str) {
        self.groups.entry(group.to_string()).or_default();
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// Register `target` for an exact path. Overwrites an earlier target.
    pub fn add_route(
        &mut self,
        group: &str,
        method: Method,
        path: &str,
        target: RouteEntry,
    ) -> Result<(), ConfigurationError> {
        let methods = self
            .groups
            .get_mut(group)
            .ok_or_else(|| ConfigurationError::UnknownGroup(group.to_string()))?;

        let path = normalize(path);
        tracing::debug!(group = %group, method = %method, path = %path, target = ?target, "Route registered");
        if let Some(previous) = methods.entry(method.clone()).or_default().insert(path.clone(), target) {
            tracing::warn!(group = %group, method = %method, path = %path, previous = ?previous, "Route overwritten");
        }
        Ok(())
    }

    /// Exact lookup of an already-normalized path.
    pub fn lookup(&self, group: &str, method: &Method, pathname: &str) -> Option<&RouteEntry> {
        self.groups.get(group)?.get(method)?.get(pathname)
    }

    /// Number of routes across all groups.
    pub fn len(&self) -> usize {
        self.groups
            .values()
            .flat_map(|methods| methods.values())
            .map(HashMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
