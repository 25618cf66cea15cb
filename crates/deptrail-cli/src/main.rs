use std::io;

use clap::Parser;
use deptrail_cli::commands;
use deptrail_cli::config::Cli;
use deptrail_logging::DeptrailSubscriberBuilder;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings()?;

    // Held until exit so buffered file output is flushed
    let _guard = DeptrailSubscriberBuilder::new()
        .with_config(settings.logging.clone())
        .init()?;

    let walker = commands::open_walker(&settings)?;
    commands::run(&cli.command, &walker, &mut io::stdout().lock())
}
