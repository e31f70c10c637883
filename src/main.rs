//! pdfannots - Entry point
//!
//! Extracts annotations from PDF files and prints them as Markdown, plain
//! text, JSON or CSV.

use clap::Parser;
use pdfannots::cli::{run, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Initialize logging; stdout is reserved for the rendered output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdfannots=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false),
        )
        .init();

    run(Cli::parse())
}
