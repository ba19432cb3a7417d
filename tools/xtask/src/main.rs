//! Workspace automation tasks.
//!
//! Run with: `cargo xtask <command>`

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Matpack workspace automation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks locally
    Ci,
    /// Validate workspace conventions
    Lint,
    /// Generate coverage report
    Coverage,
    /// Seed a synthetic data root for local demos
    Fixture(FixtureArgs),
}

#[derive(Args)]
struct FixtureArgs {
    /// Directory to seed (created if absent)
    #[arg(long, default_value = "demo-data")]
    root: PathBuf,

    /// Composition to seed runs for
    #[arg(long, default_value = "Zr49Cu49Al2")]
    composition: String,

    /// Number of runs to seed
    #[arg(long, default_value = "2")]
    runs: u32,

    /// Number of sub-runs per run (sub-run 0 plus augmentation range)
    #[arg(long, default_value = "15")]
    sub_runs: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci => run_ci(),
        Commands::Lint => run_lint(),
        Commands::Coverage => run_coverage(),
        Commands::Fixture(args) => run_fixture(&args),
    }
}

fn run_ci() -> Result<()> {
    println!("Running CI checks...\n");

    run_cmd("cargo", &["fmt", "--check"])?;
    run_cmd("cargo", &["clippy", "--workspace", "--", "-D", "warnings"])?;
    run_cmd("cargo", &["test", "--workspace"])?;
    run_cmd("cargo", &["doc", "--workspace", "--no-deps"])?;

    println!("\nAll CI checks passed!");
    Ok(())
}

fn run_lint() -> Result<()> {
    println!("Validating workspace conventions...\n");

    // Check crate naming
    let crates = std::fs::read_dir("crates")?;
    for entry in crates {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with("matpack-") {
            anyhow::bail!("Crate '{}' does not follow matpack-* naming", name);
        }
    }

    println!("All conventions validated!");
    Ok(())
}

fn run_coverage() -> Result<()> {
    run_cmd("cargo", &["llvm-cov", "--workspace", "--html"])?;
    println!("\nCoverage report: target/llvm-cov/html/index.html");
    Ok(())
}

/// Seeds the directory layout the API expects under its data root, so
/// `matpack-api` can be pointed at it with `MATPACK_DATA_ROOT` and exercised
/// end to end without real simulation output.
fn run_fixture(args: &FixtureArgs) -> Result<()> {
    let composition_dir = args.root.join(&args.composition);

    for run in 1..=args.runs {
        for sub_run in 0..args.sub_runs {
            let dir = composition_dir
                .join("c/md/lammps/100")
                .join(run.to_string())
                .join("2000")
                .join(sub_run.to_string());
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("create {}", dir.display()))?;
            std::fs::write(dir.join("zca.scf.in"), "synthetic DFT input\n")?;
            std::fs::write(dir.join("ICOHPLIST.lobster"), "synthetic bond labels\n")?;

            let descriptor_dir = args
                .root
                .join(format!("{}-SOAPS", args.composition))
                .join("c/md/lammps/100")
                .join(run.to_string())
                .join("2000")
                .join(sub_run.to_string());
            std::fs::create_dir_all(&descriptor_dir)
                .with_context(|| format!("create {}", descriptor_dir.display()))?;
            std::fs::write(descriptor_dir.join("SOAPS.vec"), "synthetic descriptors\n")?;
        }
    }
    std::fs::write(
        composition_dir.join("zca-th300.dump"),
        "synthetic LAMMPS dump\n",
    )?;

    println!(
        "Seeded {} run(s) x {} sub-run(s) for {} under {}",
        args.runs,
        args.sub_runs,
        args.composition,
        args.root.display()
    );
    println!(
        "Try: MATPACK_DATA_ROOT={} MATPACK_DEBUG=true cargo run -p matpack-api",
        args.root.display()
    );
    Ok(())
}

fn run_cmd(cmd: &str, args: &[&str]) -> Result<()> {
    println!("$ {} {}", cmd, args.join(" "));
    let status = Command::new(cmd)
        .args(args)
        .status()
        .with_context(|| format!("Failed to run: {} {}", cmd, args.join(" ")))?;

    if !status.success() {
        anyhow::bail!("Command failed: {} {}", cmd, args.join(" "));
    }
    Ok(())
}
