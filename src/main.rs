//! formatgate - content-gated formatting pipeline
//!
//! Main entry point for the command-line tool.
//!
//! # Execution Flow
//!
//! 1. Parse arguments (`check` or `apply`)
//! 2. Load layered settings and initialize logging (stderr, optional rolling file)
//! 3. Load `formatgate.yaml` and validate every selected format
//! 4. Run each format: resolve targets, skip excluded files, format the rest
//! 5. Print diffs and the merged summary, exit with its status

use clap::Parser;
use formatgate::cli::{CliArgs, run_cli};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    let exit_code = run_cli(&args).await;
    std::process::exit(exit_code);
}
