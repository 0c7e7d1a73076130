//! qabank CLI: builds the interview question bank from markdown sources.
//!
//! Reads curated interview-question READMEs, extracts normalized question
//! records and maintains the JSON corpus consumed by the client app.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
