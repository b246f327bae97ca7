//! `outagelog` - CLI for recording and browsing power outages.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Write;

use anyhow::Context;
use clap::Parser;

use outagelog::cli::{App, Cli, Command, ConfigCommand};
use outagelog::{init_logging, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config_path = cli.config.clone().unwrap_or_else(Config::default_config_path);

    // `config validate` must still run when the configuration is broken.
    let config = match Config::load_from(Some(config_path.clone())) {
        Ok(config) => config,
        Err(e) if matches!(cli.command, Command::Config(ConfigCommand::Validate { .. })) => {
            tracing::debug!(error = %e, "Using defaults to validate a broken configuration");
            Config::default()
        }
        Err(e) => return Err(e).context("failed to load configuration"),
    };

    let app = App::new(config).with_config_path(config_path);
    let mut stdout = std::io::stdout().lock();
    app.run(cli.command, &mut stdout).await?;
    stdout.flush()?;
    Ok(())
}
