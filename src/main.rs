mod catalog;
mod cli;
mod compliance;
mod config;
mod dataset;
mod dependencies;
mod model;
mod overlap;
mod pipeline;
mod stats;
mod window;

use std::process;

use clap::Parser;
use tracing::Level;

use cli::Cli;
use config::Config;

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(cli, config) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
