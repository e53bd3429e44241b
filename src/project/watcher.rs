//! Build directory watcher for development mode.

use std::path::Path;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::project::disk::Indexer;

/// Republishes modules when the bundler rewrites the build directory.
pub struct BuildWatcher {
    indexer: Indexer,
}

impl BuildWatcher {
    pub fn new(indexer: Indexer) -> Self {
        Self { indexer }
    }

    /// Start watching in a background thread. Dropping the returned watcher
    /// stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let indexer = self.indexer.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => apply_event(&indexer, &event),
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(1)),
        )?;

        watcher.watch(self.indexer.build_dir(), RecursiveMode::Recursive)?;

        tracing::info!(path = ?self.indexer.build_dir(), "Build watcher started");
        Ok(watcher)
    }
}

fn apply_event(indexer: &Indexer, event: &Event) {
    if !(event.kind.is_create() || event.kind.is_modify() || event.kind.is_remove()) {
        return;
    }
    for path in &event.paths {
        sync_path(indexer, path);
    }
}

/// Bring the cache in line with what is on disk at `path`.
fn sync_path(indexer: &Indexer, path: &Path) {
    if path.is_file() {
        if let Err(e) = indexer.index_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to index module");
        }
    } else {
        indexer.forget_file(path);
    }
}
