//! CLI entry point for building tile stores and composing photomosaics

use clap::Parser;
use photomosaic::io::cli::{Cli, CommandRunner};
use photomosaic::io::logging::init_logging;

fn main() -> photomosaic::Result<()> {
    let cli = Cli::parse();
    let _logger = init_logging(&cli.log_level)?;
    let mut runner = CommandRunner::new(cli);
    runner.run()
}
