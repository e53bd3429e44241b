//! Dispatch-class decision.
//!
//! # Responsibilities
//! - Classify every request into exactly one `DispatchDecision`
//! - Apply the fixed priority order, first match wins:
//!   1. HMR upgrade path
//!   2. existing file under the public root
//!   3. API prefix
//!   4. compiled-output prefix
//!   5. server-side rendering
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - The file check is the only I/O and is async
//! - Paths that would escape the public root never count as files

use std::path::{Path, PathBuf};

use crate::config::schema::DispatchConfig;
use crate::pipeline::registry::{API_GROUP, WEB_GROUP};
use crate::routing::matcher::{ExactMatcher, Matcher, PathPrefixMatcher};
use crate::routing::path::{join_under, normalize};

/// Where a request goes. Produced once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchDecision {
    Hmr,
    StaticFile(PathBuf),
    Api(String),
    Module(String),
    Ssr(String),
}

impl DispatchDecision {
    /// Pipeline group that gates this request. HMR upgrades run none.
    pub fn group(&self) -> Option<&'static str> {
        match self {
            Self::Hmr => None,
            Self::Api(_) => Some(API_GROUP),
            Self::StaticFile(_) | Self::Module(_) | Self::Ssr(_) => Some(WEB_GROUP),
        }
    }

    /// Static label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hmr => "hmr",
            Self::StaticFile(_) => "static",
            Self::Api(_) => "api",
            Self::Module(_) => "module",
            Self::Ssr(_) => "ssr",
        }
    }
}

/// Classifies requests by path.
#[derive(Debug, Clone)]
pub struct Router {
    hmr: ExactMatcher,
    api: PathPrefixMatcher,
    dist: PathPrefixMatcher,
    public_root: PathBuf,
}

impl Router {
    pub fn new(public_root: impl Into<PathBuf>, dispatch: &DispatchConfig) -> Self {
        Self {
            hmr: ExactMatcher::new(dispatch.hmr_path.clone()),
            api: PathPrefixMatcher::new(dispatch.api_prefix.clone()),
            dist: PathPrefixMatcher::new(dispatch.dist_prefix.clone()),
            public_root: public_root.into(),
        }
    }

    pub fn public_root(&self) -> &Path {
        &self.public_root
    }

    pub fn api_prefix(&self) -> &PathPrefixMatcher {
        &self.api
    }

    /// Decide where the request for `raw_path` goes.
    pub async fn resolve(&self, raw_path: &str) -> DispatchDecision {
        let pathname = normalize(raw_path);

        if self.hmr.matches(&pathname) {
            return DispatchDecision::Hmr;
        }

        if let Some(file) = self.public_file(&pathname).await {
            return DispatchDecision::StaticFile(file);
        }

        if self.api.matches(&pathname) {
            return DispatchDecision::Api(pathname);
        }

        if self.dist.matches(&pathname) {
            return DispatchDecision::Module(pathname);
        }

        DispatchDecision::Ssr(pathname)
    }

    async fn public_file(&self, pathname: &str) -> Option<PathBuf> {
        if pathname == "/" {
            return None;
        }
        let candidate = join_under(&self.public_root, pathname)?;
        match tokio::fs::metadata(&candidate).await {
            Ok(meta) if meta.is_file() => Some(candidate),
            _ => None,
        }
    }
}
