//! Command-line entry point for mask-annotator.

mod cli;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let args = cli::CliArgs::parse();
    cli::run(args)
}
