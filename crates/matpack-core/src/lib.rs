//! # matpack-core
//!
//! Shared foundation for the Matpack data-packaging service:
//!
//! - **Errors**: the workspace-wide [`Error`] type and [`Result`] alias
//! - **Data paths**: typed helpers over the read-only simulation data root
//! - **Observability**: logging initialization and span constructors
//!
//! Domain logic (run registry, archive production) lives in `matpack-data`;
//! this crate carries no policy.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod data_paths;
pub mod error;
pub mod observability;

pub use data_paths::DataPaths;
pub use error::{Error, Result};
