mod commands;
mod output;
mod profile;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use output::{OutputFormat, OutputRenderer};
use profile::Overrides;
use redmine_api::{ApiError, Client};
use redmine_config::Config;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "redmine-cli", version, about = "Command line client for the Redmine REST API", long_about = None)]
struct Cli {
    /// Profile to use from config file
    #[arg(short, long)]
    profile: Option<String>,

    /// Path to config file (defaults to ~/.redmine-cli/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Redmine base URL, overrides the profile
    #[arg(long, env = "REDMINE_URL")]
    url: Option<String>,

    /// API key, overrides the environment and the profile
    #[arg(long)]
    api_key: Option<String>,

    /// Output format for decoded responses
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    output: OutputFormat,

    /// Enable verbose logging
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: TopCommand,
}

#[derive(Subcommand, Debug)]
enum TopCommand {
    #[command(flatten)]
    Request(commands::Command),
    /// Manage connection profiles in the config file
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug)?;

    let mut config = Config::load(cli.config.as_ref())?;
    let renderer = OutputRenderer::new(cli.output);

    let command = match cli.command {
        TopCommand::Config(command) => {
            return commands::config::handle(
                command,
                &mut config,
                cli.config.as_deref(),
                &renderer,
            );
        }
        TopCommand::Request(command) => command,
    };

    let overrides = Overrides {
        profile: cli.profile.clone(),
        url: cli.url.clone(),
        api_key: cli.api_key.clone(),
    };
    let client_config =
        profile::resolve_client_config(&config, &overrides, |key| std::env::var(key).ok())?;

    let client = Client::with_config(client_config);

    let result = commands::execute(command, client, &renderer).await;
    if let Err(err) = &result {
        if let Some(hint) = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<ApiError>())
            .and_then(ApiError::suggestion)
        {
            eprintln!("hint: {hint}");
        }
    }
    result
}

fn init_tracing(debug: bool) -> Result<()> {
    let default = if debug {
        "info,redmine_cli=debug,redmine_api=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logger: {err}"))
}
