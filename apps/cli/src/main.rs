//! sitebuild CLI — static-site asset pipeline.
//!
//! Copies vendor libraries, compiles and minifies stylesheets and scripts,
//! mirrors media and HTML into the output tree, and serves a live-reload
//! preview in watch mode.

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
