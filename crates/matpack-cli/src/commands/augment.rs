//! Augment command - schedule augmentation sub-runs.

use anyhow::Result;
use clap::Args;

use crate::client::ApiClient;
use crate::{Config, OutputFormat};

/// Arguments for the augment command.
#[derive(Debug, Args)]
pub struct AugmentArgs {
    /// Nominal composition.
    #[arg()]
    pub composition: String,

    /// Run ID to augment.
    #[arg()]
    pub run_id: String,
}

/// Execute the augment command.
///
/// # Errors
///
/// Returns an error if the API request fails.
pub async fn execute(args: AugmentArgs, config: &Config) -> Result<()> {
    let client = ApiClient::new(config)?;

    let response = client.augment(&args.composition, &args.run_id).await?;

    match config.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text | OutputFormat::Table => {
            println!("Augmentation scheduled!");
            println!();
            println!("  Composition: {}", response.composition);
            println!("  Run ID:      {}", response.run_id);
            println!("  Status:      {}", response.status);
        }
    }

    Ok(())
}
