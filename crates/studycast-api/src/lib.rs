//! Axum HTTP API server.
//!
//! This crate provides:
//! - Resource generation requests with per-artifact deduplication
//! - Idempotent status polling and job inspection/cancellation
//! - Learning plan generation
//! - Security headers, request IDs and Prometheus metrics

pub mod caller;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
