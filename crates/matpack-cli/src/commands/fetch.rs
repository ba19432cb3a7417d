//! Fetch command - download and unpack a sub-run archive.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use crate::client::ApiClient;
use crate::Config;

/// Arguments for the fetch command.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Nominal composition.
    #[arg()]
    pub composition: String,

    /// Run ID to fetch.
    #[arg()]
    pub run_id: String,

    /// Sub-run to fetch.
    #[arg(default_value = "0")]
    pub sub_run: String,

    /// Directory to unpack the archive into.
    #[arg(long, short = 'o', default_value = ".")]
    pub output: PathBuf,

    /// Maximum number of download attempts. Archives for freshly scheduled
    /// runs may not be ready yet, so the download is retried.
    #[arg(long, default_value = "10")]
    pub attempts: u32,

    /// Delay between download attempts (in seconds).
    #[arg(long, default_value = "3")]
    pub retry_interval: u64,

    /// Keep the downloaded ZIP next to the unpacked files.
    #[arg(long)]
    pub keep_archive: bool,
}

/// Execute the fetch command.
///
/// # Errors
///
/// Returns an error if every download attempt fails, or if the archive
/// cannot be written or unpacked.
pub async fn execute(args: FetchArgs, config: &Config) -> Result<()> {
    let client = ApiClient::new(config)?;

    let bytes = download_with_retries(&client, &args).await?;

    fs::create_dir_all(&args.output).with_context(|| {
        format!("create output directory {}", args.output.display())
    })?;

    let archive_name = format!(
        "{}_{}_{}.zip",
        args.composition, args.run_id, args.sub_run
    );
    let archive_path = args.output.join(&archive_name);
    fs::write(&archive_path, &bytes)
        .with_context(|| format!("write archive {}", archive_path.display()))?;

    let count = unpack(&bytes, &args.output)?;

    if !args.keep_archive {
        fs::remove_file(&archive_path)
            .with_context(|| format!("remove archive {}", archive_path.display()))?;
    }

    println!(
        "Unpacked {count} file(s) into {} ({} bytes downloaded)",
        args.output.display(),
        bytes.len()
    );
    if args.keep_archive {
        println!("Archive kept at {}", archive_path.display());
    }

    Ok(())
}

async fn download_with_retries(client: &ApiClient, args: &FetchArgs) -> Result<Vec<u8>> {
    use std::time::Duration;
    use tokio::time::sleep;

    let mut last_error = None;
    for attempt in 1..=args.attempts {
        match client
            .download(&args.composition, &args.run_id, &args.sub_run)
            .await
        {
            Ok(bytes) => return Ok(bytes),
            Err(error) => {
                eprintln!(
                    "  [{attempt}/{}] download not ready: {error}",
                    args.attempts
                );
                last_error = Some(error);
                if attempt < args.attempts {
                    sleep(Duration::from_secs(args.retry_interval)).await;
                }
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| anyhow::anyhow!("no download attempts were made"))
        .context(format!(
            "archive for {}/{}/{} not available after {} attempts",
            args.composition, args.run_id, args.sub_run, args.attempts
        )))
}

fn unpack(bytes: &[u8], output: &Path) -> Result<usize> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).context("open downloaded archive")?;
    let count = archive.len();
    archive
        .extract(output)
        .with_context(|| format!("unpack archive into {}", output.display()))?;
    Ok(count)
}
