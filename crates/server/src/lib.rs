//! Learning style detection service
//!
//! HTTP surface over the style library: prediction, prediction lookup,
//! health checks, and Prometheus metrics.

pub mod api;
pub mod config;
pub mod error;

pub use api::{create_router, serve, AppState};
pub use config::ServiceConfig;
pub use error::ApiError;
