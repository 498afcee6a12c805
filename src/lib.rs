//! Multi-tenant attendance portal library.

pub mod admin;
pub mod auth;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod platform;
pub mod records;
pub mod routing;
pub mod security;
pub mod session;
pub mod web;

pub use config::schema::PortalConfig;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
