//! Security response headers.
//!
//! # Responsibilities
//! - Attach frame, sniffing, referrer and content-security policies to every
//!   response, including rejections and redirects
//!
//! # Design Decisions
//! - Static values; only the CSP string comes from configuration
//! - Overriding layers so handlers cannot weaken the policy

use axum::http::header::{
    InvalidHeaderValue, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
    X_FRAME_OPTIONS,
};
use axum::http::HeaderValue;
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

/// The fixed header policy applied to every response.
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    content_security_policy: HeaderValue,
}

impl SecurityHeaders {
    pub fn new(content_security_policy: &str) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            content_security_policy: HeaderValue::from_str(content_security_policy)?,
        })
    }

    /// Wrap every route of `router` with the header layers.
    pub fn apply<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router
            .layer(SetResponseHeaderLayer::overriding(
                X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                REFERRER_POLICY,
                HeaderValue::from_static("same-origin"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                CONTENT_SECURITY_POLICY,
                self.content_security_policy.clone(),
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode, routing::get};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_headers_on_success_and_fallback() {
        let headers = SecurityHeaders::new("default-src 'self'").unwrap();
        let app = headers.apply(Router::new().route("/", get(|| async { "hi" })));

        for uri in ["/", "/missing"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            let h = response.headers();
            assert_eq!(h[X_FRAME_OPTIONS], "DENY");
            assert_eq!(h[X_CONTENT_TYPE_OPTIONS], "nosniff");
            assert_eq!(h[REFERRER_POLICY], "same-origin");
            assert_eq!(h[CONTENT_SECURITY_POLICY], "default-src 'self'");
            if uri == "/missing" {
                assert_eq!(response.status(), StatusCode::NOT_FOUND);
            }
        }
    }

    #[test]
    fn test_rejects_invalid_policy() {
        assert!(SecurityHeaders::new("bad\npolicy").is_err());
    }
}
