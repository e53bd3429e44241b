//! A `Project` backed by a prebuilt output directory.
//!
//! # Layout
//! ```text
//! dist/
//!   manifest.json          optional { "<module id>": "<hash>" }
//!   pages/index.js(.map)   compiled modules, id = "/pages/index.js"
//!   pages/index.html       prerendered page for "/"
//!   pages/blog/post.html   prerendered page for "/blog/post"
//!   data/blog/post.json    SSR data for "/blog/post"
//!   404.html               fallback page
//!   style/app.css          compiled css
//! ```

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use walkdir::WalkDir;

use crate::error::HandlerError;
use crate::http::response::create_html;
use crate::modules::{ModuleCache, ModuleRecord};
use crate::project::{Location, Project};
use crate::routing::path::{clean_path, join_under};

const MANIFEST_FILE: &str = "manifest.json";

/// Reads modules from the build directory into the module cache.
#[derive(Debug, Clone)]
pub struct Indexer {
    build_dir: PathBuf,
    modules: Arc<ModuleCache>,
    manifest: Arc<HashMap<String, String>>,
}

impl Indexer {
    pub fn new(build_dir: impl Into<PathBuf>, modules: Arc<ModuleCache>) -> Self {
        Self {
            build_dir: build_dir.into(),
            modules,
            manifest: Arc::new(HashMap::new()),
        }
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Use hashes from `manifest.json` instead of hashing content.
    pub fn load_manifest(&mut self) -> io::Result<usize> {
        let path = self.build_dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Ok(0);
        }
        let text = std::fs::read_to_string(&path)?;
        let manifest: HashMap<String, String> =
            serde_json::from_str(&text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let count = manifest.len();
        self.manifest = Arc::new(manifest);
        Ok(count)
    }

    /// Module id for a file below the build directory, if it is a module.
    pub fn module_id(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.build_dir).ok()?;
        let name = relative.to_str()?;
        if !name.ends_with(".js") {
            return None;
        }
        Some(clean_path(&name.replace('\\', "/")))
    }

    /// Index every module in the build directory. Manifest hashes are
    /// trusted here, since the manifest describes this build.
    pub fn scan(&self) -> io::Result<usize> {
        let mut count = 0;
        for entry in WalkDir::new(&self.build_dir).into_iter().filter_map(Result::ok) {
            if entry.file_type().is_file() && self.module_id(entry.path()).is_some() {
                self.index_module(entry.path(), true)?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// Republish the module at `path` after a rebuild. Source map changes
    /// reindex their module. The content is always rehashed: the manifest
    /// only describes the build that was scanned at startup.
    pub fn index_file(&self, path: &Path) -> io::Result<()> {
        self.index_module(path, false)
    }

    fn index_module(&self, path: &Path, trust_manifest: bool) -> io::Result<()> {
        let module_path = match path.to_str().and_then(|p| p.strip_suffix(".map")) {
            Some(js) => PathBuf::from(js),
            None => path.to_path_buf(),
        };
        let Some(id) = self.module_id(&module_path) else {
            return Ok(());
        };
        if !module_path.is_file() {
            return Ok(());
        }

        let content = std::fs::read_to_string(&module_path)?;
        let source_map = std::fs::read_to_string(format!("{}.map", module_path.display())).unwrap_or_default();

        let manifest_hash = trust_manifest.then(|| self.manifest.get(&id)).flatten();
        let record = match manifest_hash {
            Some(hash) => ModuleRecord::with_hash(id, hash.clone(), content, source_map),
            None => ModuleRecord::new(id, content, source_map),
        };
        self.modules.publish(record);
        Ok(())
    }

    /// Drop the module at `path` after it was deleted.
    pub fn forget_file(&self, path: &Path) {
        if let Some(id) = self.module_id(path) {
            self.modules.remove(&id);
        }
    }
}

/// Project reading compiled output from disk.
#[derive(Debug)]
pub struct DiskProject {
    indexer: Indexer,
    modules: Arc<ModuleCache>,
    is_dev: bool,
    hmr_runtime: String,
}

impl DiskProject {
    pub fn new(build_dir: impl Into<PathBuf>, dist_prefix: &str, is_dev: bool) -> Self {
        let modules = Arc::new(ModuleCache::new(dist_prefix));
        Self {
            indexer: Indexer::new(build_dir, Arc::clone(&modules)),
            hmr_runtime: clean_path(&format!("{}/-/hmr.js", dist_prefix)),
            modules,
            is_dev,
        }
    }

    /// Index the build directory. `force_reload` ignores `manifest.json`.
    pub async fn load(mut self, force_reload: bool) -> io::Result<Self> {
        if force_reload {
            tracing::info!("Forced reload, hashing every module");
        } else {
            let entries = self.indexer.load_manifest()?;
            tracing::debug!(entries, "Manifest loaded");
        }

        let indexer = self.indexer.clone();
        let count = tokio::task::spawn_blocking(move || indexer.scan())
            .await
            .map_err(io::Error::other)??;
        tracing::info!(
            build_dir = %self.indexer.build_dir().display(),
            modules = count,
            "Project ready"
        );
        Ok(self)
    }

    pub fn indexer(&self) -> &Indexer {
        &self.indexer
    }

    pub fn is_dev(&self) -> bool {
        self.is_dev
    }

    async fn read_first(&self, candidates: &[Option<PathBuf>]) -> io::Result<Option<String>> {
        for path in candidates.iter().flatten() {
            match tokio::fs::read_to_string(path).await {
                Ok(text) => return Ok(Some(text)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl Project for DiskProject {
    fn modules(&self) -> &Arc<ModuleCache> {
        &self.modules
    }

    fn build_dir(&self) -> Option<&Path> {
        Some(self.indexer.build_dir())
    }

    fn is_hmrable(&self, id: &str) -> bool {
        self.is_dev && (id.starts_with("/pages/") || id.starts_with("/components/"))
    }

    fn inject_hmr(&self, record: &ModuleRecord) -> String {
        format!(
            "import {{ createHotContext }} from {runtime:?};\nimport.meta.hot = createHotContext({id:?});\n{content}",
            runtime = self.hmr_runtime,
            id = record.id,
            content = record.js_content,
        )
    }

    async fn page_html(&self, location: &Location) -> Result<(StatusCode, String), HandlerError> {
        let build_dir = self.indexer.build_dir();
        let pages = build_dir.join("pages");
        let candidates = if location.pathname == "/" {
            vec![Some(pages.join("index.html"))]
        } else {
            vec![
                join_under(&pages, &format!("{}.html", location.pathname)),
                join_under(&pages, &format!("{}/index.html", location.pathname)),
            ]
        };

        if let Some(html) = self.read_first(&candidates).await? {
            return Ok((StatusCode::OK, html));
        }
        if let Some(html) = self.read_first(&[Some(build_dir.join("404.html"))]).await? {
            return Ok((StatusCode::NOT_FOUND, html));
        }
        Ok((
            StatusCode::NOT_FOUND,
            create_html(
                "en",
                &["<title>404 - page not found</title>"],
                "<p><strong><code>404</code></strong><small> - </small><span>page not found</span></p>",
            ),
        ))
    }

    async fn ssr_data(&self, location: &Location) -> Result<(StatusCode, serde_json::Value), HandlerError> {
        let name = if location.pathname == "/" {
            "/index".to_string()
        } else {
            location.pathname.clone()
        };
        let candidate = join_under(&self.indexer.build_dir().join("data"), &format!("{}.json", name));
        match self.read_first(&[candidate]).await? {
            Some(text) => Ok((StatusCode::OK, serde_json::from_str(&text)?)),
            None => Ok((StatusCode::NOT_FOUND, serde_json::Value::Null)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, name: &str, content: &str) {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_load_indexes_modules() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "pages/index.js", "export default 1");
        write(dir.path(), "pages/index.js.map", "{\"version\":3}");
        write(dir.path(), "style/app.css", "body{}");

        let project = DiskProject::new(dir.path(), "/_aleph/", true).load(false).await.unwrap();
        assert_eq!(project.modules().ids(), vec!["/pages/index.js".to_string()]);

        let record = project.get_module_by_path("/_aleph/pages/index.js").unwrap();
        assert_eq!(record.js_source_map, "{\"version\":3}");
        assert!(project.is_hmrable(&record.id));
    }

    #[tokio::test]
    async fn test_manifest_hash_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app.js", "export default 1");
        write(dir.path(), "manifest.json", "{\"/app.js\":\"feedfacefeedface\"}");

        let project = DiskProject::new(dir.path(), "/_aleph/", false).load(false).await.unwrap();
        assert_eq!(project.get_module("/app.js").unwrap().hash, "feedfacefeedface");

        let forced = DiskProject::new(dir.path(), "/_aleph/", false).load(true).await.unwrap();
        assert_eq!(forced.get_module("/app.js").unwrap().hash.len(), 64);
    }

    #[tokio::test]
    async fn test_hmr_only_in_dev_for_pages_and_components() {
        let dir = tempfile::tempdir().unwrap();
        let dev = DiskProject::new(dir.path(), "/_aleph/", true);
        let prod = DiskProject::new(dir.path(), "/_aleph/", false);
        assert!(dev.is_hmrable("/components/nav.js"));
        assert!(!dev.is_hmrable("/api/users.js"));
        assert!(!prod.is_hmrable("/pages/index.js"));

        let injected = dev.inject_hmr(&ModuleRecord::new("/pages/index.js", "export default 1", ""));
        assert!(injected.starts_with("import { createHotContext } from \"/_aleph/-/hmr.js\";"));
        assert!(injected.contains("createHotContext(\"/pages/index.js\")"));
        assert!(injected.ends_with("export default 1"));
    }

    #[tokio::test]
    async fn test_page_html_lookup() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "pages/index.html", "<h1>home</h1>");
        write(dir.path(), "pages/blog/index.html", "<h1>blog</h1>");
        write(dir.path(), "pages/about.html", "<h1>about</h1>");
        let project = DiskProject::new(dir.path(), "/_aleph/", false);

        let (status, html) = project.page_html(&Location::new("/", "")).await.unwrap();
        assert_eq!((status, html.as_str()), (StatusCode::OK, "<h1>home</h1>"));
        let (_, html) = project.page_html(&Location::new("/about", "")).await.unwrap();
        assert_eq!(html, "<h1>about</h1>");
        let (_, html) = project.page_html(&Location::new("/blog", "")).await.unwrap();
        assert_eq!(html, "<h1>blog</h1>");

        let (status, html) = project.page_html(&Location::new("/missing", "")).await.unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(html.contains("404"));

        write(dir.path(), "404.html", "custom not found");
        let (_, html) = project.page_html(&Location::new("/missing", "")).await.unwrap();
        assert_eq!(html, "custom not found");
    }

    #[tokio::test]
    async fn test_ssr_data() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "data/foo.json", "{\"x\":1}");
        write(dir.path(), "data/broken.json", "{");
        let project = DiskProject::new(dir.path(), "/_aleph/", false);

        let (status, data) = project.ssr_data(&Location::new("/foo", "")).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(data, serde_json::json!({"x": 1}));

        let (status, _) = project.ssr_data(&Location::new("/nope", "")).await.unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);

        assert!(project.ssr_data(&Location::new("/broken", "")).await.is_err());
    }

    #[test]
    fn test_module_id() {
        let indexer = Indexer::new("/srv/dist", Arc::new(ModuleCache::new("/_aleph/")));
        assert_eq!(
            indexer.module_id(Path::new("/srv/dist/pages/index.js")),
            Some("/pages/index.js".to_string())
        );
        assert_eq!(indexer.module_id(Path::new("/srv/dist/pages/index.js.map")), None);
        assert_eq!(indexer.module_id(Path::new("/elsewhere/index.js")), None);
    }
}
