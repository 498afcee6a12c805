//! Path matching for the route policy table.
//!
//! # Responsibilities
//! - Match exact paths
//! - Match path prefixes on segment boundaries
//! - Rank overlapping matches so the most specific rule wins
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A prefix `/admin` matches `/admin` and `/admin/...` but not `/administrator`
//! - Exact rules outrank prefix rules of the same length
//! - No regex to guarantee O(n) matching

/// Trait for matching request paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;

    /// Rank used to pick between several matching rules (higher wins).
    fn specificity(&self) -> usize;
}

/// Matches one path exactly.
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
    fn matches(&self, path: &str) -> bool {
        path == self.path
    }

    fn specificity(&self) -> usize {
        self.path.len() * 2 + 1
    }
}

/// Matches a path prefix on a segment boundary.
#[derive(Debug, Clone)]
pub struct PrefixMatcher {
    prefix: String,
}

impl PrefixMatcher {
    /// Trailing slashes are ignored: `/admin/` behaves like `/admin`.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        Self {
            prefix: trimmed.to_string(),
        }
    }
}

impl Matcher for PrefixMatcher {
    fn matches(&self, path: &str) -> bool {
        if self.prefix.is_empty() {
            return true;
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    fn specificity(&self) -> usize {
        self.prefix.len() * 2
    }
}
