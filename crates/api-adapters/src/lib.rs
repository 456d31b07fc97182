//! # api-adapters
//!
//! HTML front end over the `services` use cases: axum routing, session
//! extractors, askama pages, the index page cache and Prometheus metrics.

pub mod metrics;
pub mod views;

#[cfg(feature = "web-axum")]
mod cache;
#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod extractors;
#[cfg(feature = "web-axum")]
mod handlers;
#[cfg(feature = "web-axum")]
mod router;
#[cfg(feature = "web-axum")]
pub mod state;

pub use metrics::Metrics;

#[cfg(feature = "web-axum")]
pub use error::ApiError;
#[cfg(feature = "web-axum")]
pub use extractors::SESSION_COOKIE;
#[cfg(feature = "web-axum")]
pub use router::router;
#[cfg(feature = "web-axum")]
pub use state::{AppState, Backends, WebConfig};
