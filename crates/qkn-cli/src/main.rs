//! qkn - command-line client for the Quantum Knowledge Network.

use anyhow::Context;
use clap::Parser;
use qkn_cli::commands;
use qkn_cli::config::{qkn_dir, Profile};
use qkn_cli::repl::{self, InputSettings};
use qkn_cli::{Cli, Command, Config, Formatter};
use qkn_sdk::QknClient;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load or create config
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => Config::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Using default configuration");
            let cfg = Config::default();
            cfg.save().ok();
            cfg
        }),
    };

    if let Some(profile_name) = cli.profile {
        config.switch_profile(profile_name)?;
    }

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    // Profile management never talks to the service
    let command = match cli.command {
        Some(Command::Profile(args)) => {
            commands::execute_profile(args, &mut config, &formatter).await?;
            return Ok(());
        }
        Some(command) => command,
        None => Command::View,
    };

    if let Some(url) = cli.url {
        let current = config.get_active_profile()?.clone();
        let name = config.active_profile.clone();
        config.set_profile(
            name,
            Profile {
                service_url: url,
                ..current
            },
        );
    }

    let profile = config.get_active_profile()?;
    let client = QknClient::with_options(&profile.service_url, config.client_options()?)
        .with_context(|| format!("Invalid service URL '{}'", profile.service_url))?;
    tracing::debug!(url = %client.service_url(), profile = %config.active_profile, "Client ready");

    match command {
        Command::View => {
            let input = InputSettings {
                history_path: qkn_dir().ok().map(|dir| dir.join("history.txt")),
                history_size: config.settings.history_size,
            };
            repl::run_view(client, input, &formatter).await?;
        }
        Command::Solve(args) => commands::execute_solve(args, &client, &formatter).await?,
        Command::History(args) => commands::execute_history(args, &client, &formatter).await?,
        Command::Watch(args) => commands::execute_watch(args, &client, &formatter).await?,
        Command::Search(args) => commands::execute_search(args, &client, &formatter).await?,
        Command::Health => commands::execute_health(&client, &formatter).await?,
        Command::Profile(_) => unreachable!(),
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "warn,qkn_sdk=info,qkn_cli=info",
        _ => "warn,qkn_sdk=debug,qkn_cli=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
