//! Host header validation.
//!
//! # Responsibilities
//! - Reject requests whose `Host` is not in the configured allow-list
//! - Run before any other processing so a rejected request touches no session
//!
//! # Design Decisions
//! - Empty allow-list disables the filter
//! - Exact match after trimming entries; empty entries are discarded
//! - HTTP/2 requests carry the host in the URI authority instead of a header

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::HOST,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::AppError;

/// Immutable set of accepted host values.
#[derive(Debug, Clone, Default)]
pub struct AllowedHosts {
    hosts: Arc<HashSet<String>>,
}

impl AllowedHosts {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts = entries
            .into_iter()
            .map(|entry| entry.as_ref().trim().to_string())
            .filter(|entry| !entry.is_empty())
            .collect();
        Self { hosts: Arc::new(hosts) }
    }

    /// Whether the filter is active at all.
    pub fn is_enabled(&self) -> bool {
        !self.hosts.is_empty()
    }

    pub fn permits(&self, host: Option<&str>) -> bool {
        if !self.is_enabled() {
            return true;
        }
        host.map(|h| self.hosts.contains(h)).unwrap_or(false)
    }
}

fn request_host(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()))
}

/// Middleware rejecting requests for hosts outside the allow-list.
pub async fn host_validation_middleware(
    State(hosts): State<AllowedHosts>,
    request: Request,
    next: Next,
) -> Response {
    let host = request_host(&request);
    if hosts.permits(host) {
        return next.run(request).await;
    }

    tracing::warn!(
        host = host.unwrap_or("<missing>"),
        path = %request.uri().path(),
        "Rejected request for disallowed host"
    );
    AppError::InvalidHost.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_disables_filter() {
        let hosts = AllowedHosts::new(Vec::<String>::new());
        assert!(!hosts.is_enabled());
        assert!(hosts.permits(Some("anything.test")));
        assert!(hosts.permits(None));
    }

    #[test]
    fn test_entries_are_trimmed_and_blank_entries_dropped() {
        let hosts = AllowedHosts::new(["  portal.example.com ", "", "   "]);
        assert!(hosts.is_enabled());
        assert!(hosts.permits(Some("portal.example.com")));
        assert!(!hosts.permits(Some("")));
    }

    #[test]
    fn test_exact_match_only() {
        let hosts = AllowedHosts::new(["portal.example.com", "localhost:8080"]);
        assert!(hosts.permits(Some("localhost:8080")));
        assert!(!hosts.permits(Some("localhost")));
        assert!(!hosts.permits(Some("evil.example.com")));
        assert!(!hosts.permits(Some("sub.portal.example.com")));
        assert!(!hosts.permits(None));
    }

    #[test]
    fn test_blank_only_list_is_disabled() {
        let hosts = AllowedHosts::new([" ", ""]);
        assert!(!hosts.is_enabled());
    }
}
