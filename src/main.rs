//! WebAPK Builder - one-shot build pipeline driver.
//!
//! This binary runs a single build job from command line arguments and
//! prints the progress-event stream as JSON lines, one event per line.

mod builder;
mod cli;
mod error;

use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
