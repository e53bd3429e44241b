//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use tails_server::config::{AppConfig, ServerConfig, ServerConfigBuilder};
use tails_server::error::HandlerError;
use tails_server::http::HttpServer;
use tails_server::http::RequestContext;
use tails_server::lifecycle::Shutdown;
use tails_server::modules::{ModuleCache, ModuleRecord};
use tails_server::net::listener::bind_with_retry;
use tails_server::pipeline::Pipe;
use tails_server::project::{Location, Project};

/// In-memory project: pages and SSR data are canned, modules are published
/// straight into the cache.
pub struct MemoryProject {
    pub modules: Arc<ModuleCache>,
    pub pages: HashMap<String, (StatusCode, String)>,
    pub data: HashMap<String, (StatusCode, serde_json::Value)>,
    pub hmrable: HashSet<String>,
    pub failing_pages: HashSet<String>,
    pub panicking_pages: HashSet<String>,
}

impl MemoryProject {
    pub fn new() -> Self {
        Self {
            modules: Arc::new(ModuleCache::new("/_aleph/")),
            pages: HashMap::new(),
            data: HashMap::new(),
            hmrable: HashSet::new(),
            failing_pages: HashSet::new(),
            panicking_pages: HashSet::new(),
        }
    }

    pub fn page(mut self, pathname: &str, html: &str) -> Self {
        self.pages.insert(pathname.into(), (StatusCode::OK, html.into()));
        self
    }

    pub fn data(mut self, pathname: &str, status: StatusCode, value: serde_json::Value) -> Self {
        self.data.insert(pathname.into(), (status, value));
        self
    }

    pub fn module(self, id: &str, content: &str) -> Self {
        self.modules.publish(ModuleRecord::new(id, content, format!("{{\"file\":\"{}\"}}", id)));
        self
    }
}

#[async_trait]
impl Project for MemoryProject {
    fn modules(&self) -> &Arc<ModuleCache> {
        &self.modules
    }

    fn is_hmrable(&self, id: &str) -> bool {
        self.hmrable.contains(id)
    }

    fn inject_hmr(&self, record: &ModuleRecord) -> String {
        format!("import.meta.hot = createHotContext({:?});\n{}", record.id, record.js_content)
    }

    async fn page_html(&self, location: &Location) -> Result<(StatusCode, String), HandlerError> {
        if self.panicking_pages.contains(&location.pathname) {
            panic!("renderer panicked on {}", location.pathname);
        }
        if self.failing_pages.contains(&location.pathname) {
            return Err(HandlerError::Project(format!("render failed for {}", location.pathname)));
        }
        Ok(self
            .pages
            .get(&location.pathname)
            .cloned()
            .unwrap_or((StatusCode::NOT_FOUND, "<h1>not found</h1>".into())))
    }

    async fn ssr_data(&self, location: &Location) -> Result<(StatusCode, serde_json::Value), HandlerError> {
        Ok(self
            .data
            .get(&location.pathname)
            .cloned()
            .unwrap_or((StatusCode::NOT_FOUND, serde_json::Value::Null)))
    }
}

/// Records the order in which pipes ran, shared across pipes.
#[derive(Debug)]
pub struct RecordingPipe {
    pub name: &'static str,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl Pipe for RecordingPipe {
    fn name(&self) -> &str {
        self.name
    }

    fn handle(&self, request: &RequestContext) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.name, request.pathname));
    }
}

/// App root with `public/` populated from `(relative path, content)` pairs.
pub fn app_root(public_files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_files(&dir.path().join("public"), public_files);
    dir
}

pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    std::fs::create_dir_all(root).unwrap();
    for (name, content) in files {
        let path = root.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

pub fn builder(root: &Path) -> ServerConfigBuilder {
    ServerConfigBuilder::new(root, AppConfig::default())
}

pub fn server(config: ServerConfig, project: Arc<dyn Project>) -> HttpServer {
    HttpServer::new(Arc::new(config), project)
}

/// Run `server` on a free local port. Returns its address and shutdown handle.
pub async fn spawn_server(server: HttpServer) -> (SocketAddr, Shutdown) {
    let listener = bind_with_retry("127.0.0.1", 0, 1).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}
