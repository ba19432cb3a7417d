//! # matpack-api
//!
//! HTTP composition layer for the Matpack data-packaging service.
//!
//! This crate provides the API surface for Matpack, handling:
//!
//! - **Routing**: HTTP endpoint configuration
//! - **Service Wiring**: composition of the run registry and archive producer
//! - **Observability**: structured logging and health checks
//!
//! ## Design Principles
//!
//! This crate is a **thin composition layer** with no domain policy.
//! All business logic lives in `matpack-data`.
//!
//! ## Endpoints
//!
//! ```text
//! GET  /health                                      - Health check
//! GET  /ready                                       - Readiness check
//! GET  /openapi.json                                - OpenAPI document
//! POST /v1/generate/{nc}                            - Schedule a run
//! POST /v1/generate/{nc}/{run_id}/augment           - Schedule augmentation
//! GET  /v1/generate/{nc}/{run_id}/status            - Derived status
//! GET  /v1/generate/{nc}/{run_id}/{sub_run}/download - Download ZIP archive
//! GET  /v1/generate/available                       - Full registry dump
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod context;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod server;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::context::RequestContext;
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::server::Server;
}
