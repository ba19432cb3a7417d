//! CLI command implementations.

pub mod augment;
pub mod available;
pub mod fetch;
pub mod schedule;
pub mod status;
