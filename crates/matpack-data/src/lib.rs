//! # matpack-data
//!
//! Domain logic for the Matpack data-packaging service:
//!
//! - **Run registry**: the mapping of composition → scheduled runs →
//!   sub-runs, mirrored to a JSON file after every mutation
//! - **Derived status**: synthetic RUNNING/DONE progress from elapsed time
//! - **Archive producer**: deterministic collection of sub-run files into a
//!   ZIP archive
//!
//! The registry is the single source of truth for which
//! (composition, run, sub-run) triples may be downloaded. It never creates
//! simulation output; scheduling only *discovers* pre-existing directories
//! under the read-only data root.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod archive;
pub mod error;
pub mod record;
pub mod registry;

pub use archive::ArchiveProducer;
pub use error::{DataError, Result};
pub use record::{JobStatus, RunRecord, StatusReport};
pub use registry::{RegistryMap, RunRegistry, AUGMENT_SUB_RUN_MAX, DEFAULT_STATUS_THRESHOLD_SECS};
