//! Compiled module store.
//!
//! # Data Flow
//! ```text
//! Build collaborator (rebuild / delete)
//!     → ModuleCache::publish / remove  (whole-record replacement)
//!     → WatchEvent broadcast (add / modify / remove)
//!     → every HMR session's watcher
//!
//! Request for <dist prefix>...js / .js.map
//!     → ModuleCache::get / conditional_get (by request path)
//!     → 304 or body + ETag
//! ```
//!
//! # Design Decisions
//! - Records are `Arc<ModuleRecord>`, swapped whole; readers never see a
//!   record with old content and a new hash
//! - Stale hashed paths are evicted on replacement, never on read
//! - Events come from the same writes that update the cache, so HMR and
//!   module serving agree on what exists

pub mod cache;
pub mod record;

pub use cache::{Conditional, ModuleCache, WatchEvent};
pub use record::ModuleRecord;
