mod cli;
mod config;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};
use config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    let default_level = if cli.verbose || config.general.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match cli.command {
        Commands::Config(args) => config::commands::run(args)?,
        Commands::Import(args) => cli::import::run(args, cli::open_engine(cli.db, &config)?)?,
        Commands::Lookup(args) => cli::lookup::run(args, &cli::open_engine(cli.db, &config)?)?,
        Commands::Suggest(args) => cli::lookup::suggest(args, &cli::open_engine(cli.db, &config)?)?,
        Commands::DidYouMean(args) => {
            cli::lookup::did_you_mean(args, &cli::open_engine(cli.db, &config)?)?
        }
        Commands::List(args) => cli::list::run(args, &cli::open_engine(cli.db, &config)?)?,
        Commands::Delete(args) => cli::delete::run(args, cli::open_engine(cli.db, &config)?)?,
    }

    Ok(())
}
