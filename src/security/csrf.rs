//! CSRF token manager and guard.
//!
//! # Responsibilities
//! - Issue one unpredictable token per session, stable until the session rotates
//! - Validate the supplied token in constant time
//! - Reject state-changing requests without a matching token before any handler runs
//!
//! # Design Decisions
//! - A single guard wraps the whole router; there is no per-route opt-out
//! - Token transport: `csrf_token` form field, or the `x-csrf-token` header
//! - Urlencoded and multipart bodies are buffered and inspected; the body is
//!   handed on intact. Media types match case-insensitively

use axum::{
    body::{self, Body, Bytes},
    extract::{FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, request::Parts, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use url::form_urlencoded;

use crate::http::error::AppError;
use crate::observability::metrics;
use crate::security::random::random_token;
use crate::session::Session;

/// Hidden form field carrying the token.
pub const CSRF_FIELD: &str = "csrf_token";

/// Header alternative for script-driven requests.
pub const CSRF_HEADER: &str = "x-csrf-token";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data";

/// Body encodings the guard knows how to search for the token field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Form,
    Multipart,
    Other,
}

impl BodyKind {
    pub fn of(headers: &HeaderMap) -> Self {
        let media_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .unwrap_or("");
        if media_type.eq_ignore_ascii_case(FORM_CONTENT_TYPE) {
            BodyKind::Form
        } else if media_type.eq_ignore_ascii_case(MULTIPART_CONTENT_TYPE) {
            BodyKind::Multipart
        } else {
            BodyKind::Other
        }
    }
}

/// The session's token, generated and stored on first use.
pub fn get_token(session: &Session) -> String {
    if let Some(token) = session.csrf_token() {
        return token;
    }
    let token = random_token();
    session.set_csrf_token(token.clone());
    token
}

/// True iff `supplied` is non-empty and equals the session's token.
pub fn validate(session: &Session, supplied: &str) -> bool {
    if supplied.is_empty() {
        return false;
    }
    match session.csrf_token() {
        Some(stored) => stored.as_bytes().ct_eq(supplied.as_bytes()).into(),
        None => false,
    }
}

/// Methods that change state and therefore need a token.
pub fn requires_check(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Settings for the CSRF guard middleware.
#[derive(Debug, Clone)]
pub struct CsrfGuard {
    pub max_body_size: usize,
}

/// Middleware enforcing the CSRF token on state-changing requests.
///
/// Must run inside the session middleware.
pub async fn csrf_middleware(
    State(guard): State<CsrfGuard>,
    request: Request,
    next: Next,
) -> Response {
    if !requires_check(request.method()) {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let Some(session) = request.extensions().get::<Session>().cloned() else {
        tracing::error!(%method, %path, "CSRF guard ran without a session");
        return reject(&method, &path, "no_session");
    };

    let header_token = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let kind = BodyKind::of(request.headers());

    let (request, supplied) = match header_token {
        Some(token) => (request, Some(token)),
        None if kind != BodyKind::Other => {
            let (parts, body) = request.into_parts();
            let bytes = match body::to_bytes(body, guard.max_body_size).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(%method, %path, error = %e, "Failed to read form body");
                    return AppError::PayloadTooLarge.into_response();
                }
            };
            let token = match kind {
                BodyKind::Multipart => multipart_token(&parts, bytes.clone()).await,
                _ => form_token(&bytes),
            };
            (Request::from_parts(parts, Body::from(bytes)), token)
        }
        None => (request, None),
    };

    match supplied {
        Some(token) if validate(&session, &token) => {
            tracing::debug!(%method, %path, "CSRF token accepted");
            next.run(request).await
        }
        Some(_) => reject(&method, &path, "mismatch"),
        None => reject(&method, &path, "missing"),
    }
}

fn form_token(bytes: &[u8]) -> Option<String> {
    form_urlencoded::parse(bytes)
        .find(|(key, _)| key == CSRF_FIELD)
        .map(|(_, value)| value.into_owned())
}

/// Scan a buffered multipart body for the token field.
///
/// Parses a copy of the request; malformed bodies yield no token.
async fn multipart_token(parts: &Parts, bytes: Bytes) -> Option<String> {
    let mut copy = Request::new(Body::from(bytes));
    *copy.method_mut() = parts.method.clone();
    *copy.uri_mut() = parts.uri.clone();
    *copy.headers_mut() = parts.headers.clone();
    *copy.extensions_mut() = parts.extensions.clone();

    let mut multipart = Multipart::from_request(copy, &()).await.ok()?;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some(CSRF_FIELD) {
            return field.text().await.ok();
        }
    }
    None
}

fn reject(method: &Method, path: &str, reason: &'static str) -> Response {
    tracing::warn!(%method, path, reason, "Rejected request with invalid CSRF token");
    metrics::record_csrf_rejection(reason);
    AppError::InvalidCsrfToken.into_response()
}
