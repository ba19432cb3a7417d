//! Status command - check derived run status.

use anyhow::Result;
use clap::Args;
use owo_colors::OwoColorize;

use crate::client::ApiClient;
use crate::{Config, OutputFormat};

/// Arguments for the status command.
#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Nominal composition.
    #[arg()]
    pub composition: String,

    /// Run ID to check status for.
    #[arg()]
    pub run_id: String,

    /// Poll until the run (and its augmentation, if any) reports DONE.
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Poll interval when watching (in seconds).
    #[arg(long, default_value = "3")]
    pub poll_interval: u64,

    /// Maximum number of polls when watching.
    #[arg(long, default_value = "10")]
    pub attempts: u32,
}

/// Execute the status command.
///
/// # Errors
///
/// Returns an error if the API request fails, or in watch mode if the run
/// does not report DONE within the attempt budget.
pub async fn execute(args: StatusArgs, config: &Config) -> Result<()> {
    let client = ApiClient::new(config)?;

    if args.watch {
        return watch(&client, &args, config).await;
    }

    let report = client.status(&args.composition, &args.run_id).await?;

    match config.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text | OutputFormat::Table => {
            println!("Run {} of {}:", args.run_id, args.composition);
            println!("  Run:      {}", format_status_colored(&report.run_status));
            if let Some(sub_runs) = &report.sub_runs_status {
                println!("  Sub-runs: {}", format_status_colored(sub_runs));
            }
        }
    }

    Ok(())
}

async fn watch(client: &ApiClient, args: &StatusArgs, config: &Config) -> Result<()> {
    use std::time::Duration;
    use tokio::time::sleep;

    for attempt in 1..=args.attempts {
        let report = client.status(&args.composition, &args.run_id).await?;

        if report.is_done() {
            match config.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                OutputFormat::Text | OutputFormat::Table => {
                    println!(
                        "Run {} of {} is {}",
                        args.run_id,
                        args.composition,
                        "DONE".green()
                    );
                }
            }
            return Ok(());
        }

        println!(
            "  [{attempt}/{}] run={} sub_runs={}",
            args.attempts,
            format_status_colored(&report.run_status),
            report.sub_runs_status.as_deref().unwrap_or("-"),
        );
        sleep(Duration::from_secs(args.poll_interval)).await;
    }

    anyhow::bail!(
        "run {} of {} did not report DONE after {} attempts",
        args.run_id,
        args.composition,
        args.attempts
    )
}

fn format_status_colored(status: &str) -> String {
    match status {
        "DONE" => status.green().to_string(),
        "RUNNING" => status.blue().to_string(),
        _ => status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_args_parsing() {
        use clap::Parser;

        #[derive(Parser)]
        struct TestCli {
            #[command(flatten)]
            args: StatusArgs,
        }

        let cli = TestCli::parse_from(["test", "ZrCuAl", "1", "--watch"]);
        assert_eq!(cli.args.composition, "ZrCuAl");
        assert_eq!(cli.args.run_id, "1");
        assert!(cli.args.watch);
        assert_eq!(cli.args.poll_interval, 3);
        assert_eq!(cli.args.attempts, 10);
    }

    #[test]
    fn test_status_args_custom_polling() {
        use clap::Parser;

        #[derive(Parser)]
        struct TestCli {
            #[command(flatten)]
            args: StatusArgs,
        }

        let cli = TestCli::parse_from([
            "test",
            "ZrCuAl",
            "1",
            "--watch",
            "--poll-interval",
            "1",
            "--attempts",
            "30",
        ]);
        assert_eq!(cli.args.poll_interval, 1);
        assert_eq!(cli.args.attempts, 30);
    }
}
