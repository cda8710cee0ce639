//! diskmemo - maintenance CLI for memoized function caches
//!
//! Lists, inspects and clears the artifacts that `diskmemo::Memoized`
//! writes, and computes cache keys for given arguments.

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use diskmemo::DiskCache;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Parse command line arguments
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let cache = DiskCache::new(&cli.config());
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    let code = match commands::run(&cli.command, &cache, &mut writer) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = writer.flush() {
        eprintln!("Error flushing output: {}", e);
        return ExitCode::from(2);
    }

    ExitCode::from(code)
}

/// Logs go to stderr; `RUST_LOG` wins over `--verbose`
fn init_logging(verbose: bool) {
    let default = if verbose { "diskmemo=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
