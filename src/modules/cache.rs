//! Content-addressed module cache.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::modules::record::{content_hash, ModuleRecord};
use crate::observability::metrics;

const EVENT_CAPACITY: usize = 256;

/// Change notification for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Add { module_id: String, hash: String },
    Modify { module_id: String, hash: String },
    Remove { module_id: String },
}

/// Outcome of a conditional module request.
#[derive(Debug, Clone)]
pub enum Conditional {
    NotModified,
    Body(Arc<ModuleRecord>),
}

/// Modules indexed by id and by request path.
#[derive(Debug)]
pub struct ModuleCache {
    dist_prefix: String,
    records: DashMap<String, Arc<ModuleRecord>>,
    paths: DashMap<String, String>,
    events: broadcast::Sender<WatchEvent>,
}

impl ModuleCache {
    pub fn new(dist_prefix: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            dist_prefix: dist_prefix.into(),
            records: DashMap::new(),
            paths: DashMap::new(),
            events,
        }
    }

    pub fn dist_prefix(&self) -> &str {
        &self.dist_prefix
    }

    /// Insert or replace a record and announce the change.
    ///
    /// Republishing identical content is a no-op and returns `None`. A
    /// record whose content changed while its hash did not is rehashed, so
    /// a hash always identifies exactly one body.
    pub fn publish(&self, mut record: ModuleRecord) -> Option<WatchEvent> {
        if let Some(prev) = self.get_by_id(&record.id) {
            if prev.hash == record.hash && prev.js_content != record.js_content {
                tracing::warn!(module_id = %record.id, hash = %record.hash, "Module content changed under an unchanged hash, rehashing");
                record.hash = content_hash(&record.js_content);
            }
        }

        let record = Arc::new(record);
        let plain = record.plain_path(&self.dist_prefix);
        let hashed = record.hashed_path(&self.dist_prefix);

        let previous = self.records.insert(record.id.clone(), Arc::clone(&record));
        self.paths.insert(plain, record.id.clone());
        self.paths.insert(hashed.clone(), record.id.clone());

        let event = match previous {
            Some(prev) if prev.hash == record.hash => return None,
            Some(prev) => {
                let stale = prev.hashed_path(&self.dist_prefix);
                if stale != hashed {
                    self.paths.remove_if(&stale, |_, id| *id == record.id);
                }
                WatchEvent::Modify {
                    module_id: record.id.clone(),
                    hash: record.hash.clone(),
                }
            }
            None => WatchEvent::Add {
                module_id: record.id.clone(),
                hash: record.hash.clone(),
            },
        };

        tracing::debug!(event = ?event, "Module published");
        metrics::record_module_cache_size(self.records.len());
        // no subscribers is fine
        let _ = self.events.send(event.clone());
        Some(event)
    }

    /// Drop a module and announce its removal.
    pub fn remove(&self, id: &str) -> bool {
        let Some((_, record)) = self.records.remove(id) else {
            return false;
        };
        self.paths.remove(&record.plain_path(&self.dist_prefix));
        self.paths.remove(&record.hashed_path(&self.dist_prefix));

        tracing::debug!(module_id = %id, "Module removed");
        metrics::record_module_cache_size(self.records.len());
        let _ = self.events.send(WatchEvent::Remove {
            module_id: id.to_string(),
        });
        true
    }

    /// Record served at `pathname`.
    pub fn get(&self, pathname: &str) -> Option<Arc<ModuleRecord>> {
        let id = self.paths.get(pathname)?.value().clone();
        self.get_by_id(&id)
    }

    pub fn get_by_id(&self, id: &str) -> Option<Arc<ModuleRecord>> {
        self.records.get(id).map(|r| Arc::clone(r.value()))
    }

    /// `NotModified` when `if_none_match` equals the record hash exactly.
    pub fn conditional_get(&self, pathname: &str, if_none_match: Option<&str>) -> Option<Conditional> {
        let record = self.get(pathname)?;
        if if_none_match == Some(record.hash.as_str()) {
            return Some(Conditional::NotModified);
        }
        Some(Conditional::Body(record))
    }

    /// Receive every future change.
    pub fn subscribe(&self) -> broadcast::Receiver<WatchEvent> {
        self.events.subscribe()
    }

    /// Known module ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.records.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Remove every module, announcing each removal.
    pub fn clear(&self) {
        for id in self.ids() {
            self.remove(&id);
        }
    }
}
