use anyhow::Result;
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

use crate::{cargo, TARGET};

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking console builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    // no_std crates on the RP2040 target
    cargo(
        "Checking platform (no_std)",
        &["check", "-p", "platform", "--target", TARGET, "--features", "defmt"],
    )?;
    cargo(
        "Checking gpu (no_std)",
        &["check", "-p", "gpu", "--target", TARGET, "--features", "defmt"],
    )?;
    cargo(
        "Checking firmware (no_std)",
        &["check", "-p", "firmware", "--target", TARGET, "--features", "hardware"],
    )?;
    println!();

    // Host builds with tracing log sites
    cargo(
        "Checking host builds",
        &[
            "check",
            "-p",
            "gpu",
            "-p",
            "firmware",
            "--features",
            "std,tracing",
        ],
    )?;
    println!();

    // Clippy warnings are reported, not fatal
    println!("{}", "  Running clippy lints...".cyan());
    let clippy_output = Command::new("cargo")
        .args(["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])
        .output()?;
    if clippy_output.status.success() {
        println!("{}", "  ✓ Clippy passed".green());
    } else {
        eprintln!("{}", "  ⚠ Clippy warnings found".yellow().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&clippy_output.stderr));
    }
    println!();

    println!("{}", "  Checking code formatting...".cyan());
    let fmt_output = Command::new("cargo")
        .args(["fmt", "--all", "--check"])
        .output()?;
    if fmt_output.status.success() {
        println!("{}", "  ✓ Formatting check passed".green());
    } else {
        eprintln!("{}", "  ⚠ Formatting issues found".yellow().bold());
        eprintln!("     Run 'cargo fmt --all' to fix");
    }
    println!();

    println!(
        "{}",
        format!(
            "✓ All checks completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}
