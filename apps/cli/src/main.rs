//! docshelf CLI — documentation acquisition from library repositories.
//!
//! Fetches the docs of registered libraries into slug-addressed document
//! sets and compiles individual documents into render trees with outlines.

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
