//! # Scrubber Entry Point
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Initialize tracing (console + rotating files)
//!   └─> Execute the command, `run` when none is given
//! ```
//!
//! ```bash
//! scrubber                      # clean ./input, write ./output and ./summary, email
//! scrubber run --no-logs --to ops@example.com
//! scrubber detect input/sales.csv
//! ```

#![warn(clippy::all, rust_2018_idioms)]

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let log_dir = match cli.log_dir {
        Some(dir) => dir,
        None => scrubber::logging::default_log_dir()?,
    };
    scrubber::logging::init(&log_dir)?;

    cli::run_command(cli.command.unwrap_or_default())
}
