//! Schedule command - schedule a generation run.

use anyhow::Result;
use clap::Args;

use crate::client::ApiClient;
use crate::{Config, OutputFormat};

/// Arguments for the schedule command.
#[derive(Debug, Args)]
pub struct ScheduleArgs {
    /// Nominal composition to schedule (e.g. `Zr49Cu49Al2`).
    #[arg()]
    pub composition: String,
}

/// Execute the schedule command.
///
/// # Errors
///
/// Returns an error if the API request fails.
pub async fn execute(args: ScheduleArgs, config: &Config) -> Result<()> {
    let client = ApiClient::new(config)?;

    let response = client.schedule(&args.composition).await?;

    match config.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text | OutputFormat::Table => {
            println!("Run scheduled!");
            println!();
            println!("  Composition: {}", response.composition);
            println!("  Run ID:      {}", response.run_id);
            println!("  Status:      {}", response.status);
        }
    }

    Ok(())
}
