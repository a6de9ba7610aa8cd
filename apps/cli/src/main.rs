//! symptomfix CLI — one-shot cleanup of knowledge base symptom data.
//!
//! Normalizes the symptom strings stored on knowledge base records and makes
//! sure each distinct name has exactly one entry in the symptom lookup.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
