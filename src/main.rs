use anyhow::Result;
use clap::Parser;

use gmail_watch::cli::{Cli, Commands};
use gmail_watch::settings::{self, Settings};

fn main() -> Result<()> {
    let cli = Cli::parse();
    gmail_watch::logging::init(cli.verbose);

    let file = settings::load_config(cli.config.as_deref())?;
    let settings = Settings::resolve(&cli.options, &file)?;

    match cli.command.unwrap_or(Commands::Watch) {
        Commands::Watch => gmail_watch::watch::run(&settings),
        Commands::Stop => gmail_watch::watch::stop(&settings),
        Commands::Auth => gmail_watch::auth::run(&settings),
    }
}
