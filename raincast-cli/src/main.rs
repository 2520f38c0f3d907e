//! Binary crate for the `raincast` command-line companion.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive date and base-URL prompts
//! - Human-friendly output formatting

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}
