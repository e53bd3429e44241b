//! Reserved path conditions.
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Matchers see the normalized pathname, never the raw URI
//! - No regex to guarantee O(n) matching

/// Trait for matching a normalized pathname against a condition.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the pathname matches this condition.
    fn matches(&self, pathname: &str) -> bool;
}

/// Matches one literal path.
#[derive(Debug, Clone)]
pub struct ExactMatcher {
    path: String,
}

impl ExactMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Matcher for ExactMatcher {
    fn matches(&self, pathname: &str) -> bool {
        pathname == self.path
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The pathname with the prefix removed, keeping a leading slash.
    pub fn strip<'a>(&self, pathname: &'a str) -> Option<&'a str> {
        let rest = pathname.strip_prefix(self.prefix.trim_end_matches('/'))?;
        (rest.is_empty() || rest.starts_with('/')).then_some(rest)
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, pathname: &str) -> bool {
        pathname.starts_with(&self.prefix)
    }
}
