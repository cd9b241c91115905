use anyhow::Result;
use clap::Parser;

use wardmap::cli::{Cli, Commands};
use wardmap::commands::{map, report};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli.log_level())
        .with_target(cli.verbose >= 2)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Report(args) => report::run(&cli, args),
        Commands::Map(args) => map::run(&cli, args),
    }
}
