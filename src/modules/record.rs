//! A compiled module and the paths it is served under.

use sha2::{Digest, Sha256};

use crate::routing::path::clean_path;

/// Number of hash characters embedded in hashed module paths.
pub const HASH_SHORT: usize = 8;

/// One compiled module, as produced by the build collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRecord {
    /// Logical module id, e.g. `/pages/index.js`.
    pub id: String,
    /// Content hash, also used as the ETag.
    pub hash: String,
    pub js_content: String,
    pub js_source_map: String,
}

impl ModuleRecord {
    /// Build a record, hashing the content.
    pub fn new(id: impl Into<String>, js_content: impl Into<String>, js_source_map: impl Into<String>) -> Self {
        let js_content = js_content.into();
        Self {
            id: id.into(),
            hash: content_hash(&js_content),
            js_content,
            js_source_map: js_source_map.into(),
        }
    }

    /// Build a record with a hash computed elsewhere.
    pub fn with_hash(
        id: impl Into<String>,
        hash: impl Into<String>,
        js_content: impl Into<String>,
        js_source_map: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            hash: hash.into(),
            js_content: js_content.into(),
            js_source_map: js_source_map.into(),
        }
    }

    /// `<prefix>/<id>`.
    pub fn plain_path(&self, dist_prefix: &str) -> String {
        clean_path(&format!("{}/{}", dist_prefix, self.id))
    }

    /// `<prefix>/<id without .js>.<hash8>.js`.
    pub fn hashed_path(&self, dist_prefix: &str) -> String {
        hashed_module_path(dist_prefix, &self.id, &self.hash)
    }
}

/// Path of module `id` at `hash` below `prefix`.
pub fn hashed_module_path(prefix: &str, id: &str, hash: &str) -> String {
    let stem = id.strip_suffix(".js").unwrap_or(id);
    let short: String = hash.chars().take(HASH_SHORT).collect();
    clean_path(&format!("{}/{}.{}.js", prefix, stem, short))
}

/// Hex SHA-256 of module content.
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
