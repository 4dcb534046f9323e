mod cli;
mod config;
#[allow(dead_code)]
mod content;
mod engine;
mod git;
mod markers;
mod model;
mod progress;
mod recorder;
mod repository;
mod resolver;
mod session;
mod status;

use std::process;

use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
