//! Available command - list scheduled runs for every composition.

use anyhow::Result;
use clap::Args;

use crate::client::ApiClient;
use crate::{Config, OutputFormat};

/// Arguments for the available command.
#[derive(Debug, Args)]
pub struct AvailableArgs {
    /// Only list runs for this composition.
    #[arg(long, short = 'c')]
    pub composition: Option<String>,
}

/// Execute the available command.
///
/// # Errors
///
/// Returns an error if the API request fails.
pub async fn execute(args: &AvailableArgs, config: &Config) -> Result<()> {
    let client = ApiClient::new(config)?;

    let mut listing = client.available().await?;
    if let Some(composition) = &args.composition {
        listing.retain(|key, _| key == composition);
    }

    match config.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        OutputFormat::Text => {
            if listing.is_empty() {
                println!("No runs scheduled");
                return Ok(());
            }

            for (composition, runs) in &listing {
                println!("{composition}:");
                for run in runs {
                    println!(
                        "  run {} ({} sub-run(s), scheduled {})",
                        run.run_id,
                        run.sub_runs.len(),
                        run.scheduled_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
            }
        }
        OutputFormat::Table => {
            use tabled::{Table, Tabled};

            #[derive(Tabled)]
            struct RunRow {
                #[tabled(rename = "Composition")]
                composition: String,
                #[tabled(rename = "Run ID")]
                run_id: String,
                #[tabled(rename = "Sub-runs")]
                sub_runs: usize,
                #[tabled(rename = "Scheduled")]
                scheduled: String,
            }

            let rows: Vec<_> = listing
                .iter()
                .flat_map(|(composition, runs)| {
                    runs.iter().map(move |run| RunRow {
                        composition: composition.clone(),
                        run_id: run.run_id.clone(),
                        sub_runs: run.sub_runs.len(),
                        scheduled: run.scheduled_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    })
                })
                .collect();

            if rows.is_empty() {
                println!("No runs scheduled");
            } else {
                println!("{}", Table::new(rows));
            }
        }
    }

    Ok(())
}
