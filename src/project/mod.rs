//! The build/runtime collaborator ("project").
//!
//! # Data Flow
//! ```text
//! Build output on disk (dist/)
//!     → disk.rs (index *.js + *.js.map into the ModuleCache)
//!     → watcher.rs (dev only: notify events → publish / remove)
//!     → ModuleCache events → Watcher handed to each HMR session
//!
//! Request handlers ask the project for:
//!     modules (by path / id), HMR injection, page HTML, SSR data
//! ```
//!
//! # Design Decisions
//! - The server only depends on the `Project` trait; bundling and rendering
//!   stay outside this crate
//! - Watchers are plain subscriptions to the module cache's event stream

pub mod disk;
pub mod watcher;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use tokio::sync::broadcast;

use crate::error::HandlerError;
use crate::modules::{ModuleCache, ModuleRecord, WatchEvent};
use crate::net::connection::ConnectionId;

pub use disk::DiskProject;

/// Pathname plus query of a page or data request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub pathname: String,
    pub search: String,
}

impl Location {
    pub fn new(pathname: impl Into<String>, search: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            search: search.into(),
        }
    }
}

/// Subscription to module changes, owned by one HMR session.
#[derive(Debug)]
pub struct Watcher {
    id: ConnectionId,
    events: broadcast::Receiver<WatchEvent>,
}

impl Watcher {
    pub fn new(events: broadcast::Receiver<WatchEvent>) -> Self {
        Self {
            id: ConnectionId::new(),
            events,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Next event, in publication order.
    pub async fn recv(&mut self) -> Result<WatchEvent, broadcast::error::RecvError> {
        self.events.recv().await
    }
}

/// Operations the dispatch core consumes from the build collaborator.
#[async_trait]
pub trait Project: Send + Sync {
    /// The module cache this project publishes into.
    fn modules(&self) -> &Arc<ModuleCache>;

    fn get_module_by_path(&self, pathname: &str) -> Option<Arc<ModuleRecord>> {
        self.modules().get(pathname)
    }

    fn get_module(&self, id: &str) -> Option<Arc<ModuleRecord>> {
        self.modules().get_by_id(id)
    }

    /// Directory holding stylesheets and other build output, if on disk.
    fn build_dir(&self) -> Option<&Path> {
        None
    }

    /// Whether the module may be hot-replaced in the browser.
    fn is_hmrable(&self, id: &str) -> bool;

    /// Module body with the HMR bootstrap prepended.
    fn inject_hmr(&self, record: &ModuleRecord) -> String;

    /// Server-rendered HTML for a page.
    async fn page_html(&self, location: &Location) -> Result<(StatusCode, String), HandlerError>;

    /// Data a page was rendered with.
    async fn ssr_data(&self, location: &Location) -> Result<(StatusCode, serde_json::Value), HandlerError>;

    fn create_watcher(&self) -> Watcher {
        let watcher = Watcher::new(self.modules().subscribe());
        tracing::debug!(watcher = %watcher.id(), "Watcher created");
        watcher
    }

    fn remove_watcher(&self, watcher: Watcher) {
        tracing::debug!(watcher = %watcher.id(), "Watcher removed");
        drop(watcher);
    }
}
