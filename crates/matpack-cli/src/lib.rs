//! # matpack-cli
//!
//! Command-line client for the Matpack data-packaging service.
//!
//! ## Commands
//!
//! - `matpack schedule` - Schedule a generation run for a composition
//! - `matpack augment` - Schedule augmentation sub-runs for a run
//! - `matpack status` - Check derived run status
//! - `matpack fetch` - Download and unpack a sub-run archive
//! - `matpack available` - List everything the service has scheduled
//!
//! ## Configuration
//!
//! The CLI uses environment variables or command-line flags for settings:
//!
//! - `MATPACK_API_URL` - API endpoint (default: `http://localhost:8080`)

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
// CLI uses print! macros intentionally
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

pub mod client;
pub mod commands;

use clap::{Parser, Subcommand};

/// Matpack CLI - simulation-data packaging client.
#[derive(Debug, Parser)]
#[command(name = "matpack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// API server URL.
    #[arg(long, env = "MATPACK_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Output format.
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the effective configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            api_url: self.api_url.clone(),
            format: self.format.clone(),
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Schedule a generation run for a composition.
    Schedule(commands::schedule::ScheduleArgs),
    /// Schedule augmentation sub-runs for an existing run.
    Augment(commands::augment::AugmentArgs),
    /// Check derived run status.
    Status(commands::status::StatusArgs),
    /// Download and unpack a sub-run archive.
    Fetch(commands::fetch::FetchArgs),
    /// List scheduled runs for every composition.
    Available(commands::available::AvailableArgs),
}

/// Output format.
#[derive(Debug, Clone, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// Table output.
    Table,
}

/// CLI configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// API server URL.
    pub api_url: String,
    /// Output format.
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_config_from_flags() {
        let cli = Cli::parse_from([
            "matpack",
            "--api-url",
            "https://matpack.example.com",
            "--format",
            "json",
            "status",
            "ZrCuAl",
            "1",
        ]);

        let config = cli.config();
        assert_eq!(config.api_url, "https://matpack.example.com");
        assert!(matches!(config.format, OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["matpack", "available"]);
        let config = cli.config();
        assert_eq!(config.api_url, "http://localhost:8080");
        assert!(matches!(config.format, OutputFormat::Text));
    }
}
