//! pumlink CLI - PlantUML rendering links for markdown documents.
//!
//! Extracts every fenced PlantUML block into a sibling artifact file and
//! inserts an image link, rendered by a PlantUML proxy, right after the block.

mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use commands::LinkArgs;
use output::Output;

/// pumlink - Add rendering links to PlantUML blocks in markdown.
#[derive(Parser)]
#[command(name = "pumlink", version, about)]
struct Cli {
    #[command(flatten)]
    link: LinkArgs,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise RUST_LOG (errors only when unset)
    let filter = if cli.link.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = cli.link.execute(&output) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
