use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use redmine_config::{Config, Profile};
use serde::Serialize;
use url::Url;

use crate::output::OutputRenderer;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Add or update a profile in the config file
    Set(SetArgs),
    /// Show one profile (defaults to the default profile)
    Show {
        /// Profile name
        name: Option<String>,
    },
    /// List configured profiles
    List,
}

#[derive(Args, Debug, Clone)]
pub struct SetArgs {
    /// Profile name to create or update
    name: String,

    /// Redmine base URL (e.g. https://redmine.example.com)
    #[arg(long)]
    base_url: String,

    /// API key stored in the profile
    #[arg(long)]
    api_key: Option<String>,

    /// Port used instead of the one derived from the URL
    #[arg(long)]
    port: Option<u16>,

    /// Verify the server certificate on TLS ports
    #[arg(long)]
    check_ssl_certificate: bool,

    /// Verify the server host name on TLS ports
    #[arg(long)]
    check_ssl_host: bool,

    /// Do not send the API key as HTTP basic credentials
    #[arg(long)]
    no_http_auth: bool,

    /// Mark this profile as the default one
    #[arg(long)]
    default: bool,
}

/// Profile as printed; the key itself never leaves the file.
#[derive(Serialize)]
struct ProfileView<'a> {
    name: &'a str,
    base_url: &'a str,
    has_api_key: bool,
    port: Option<u16>,
    check_ssl_certificate: bool,
    check_ssl_host: bool,
    use_http_auth: bool,
    is_default: bool,
}

impl<'a> ProfileView<'a> {
    fn new(config: &'a Config, name: &'a str, profile: &'a Profile) -> Self {
        Self {
            name,
            base_url: profile.base_url.as_deref().unwrap_or(""),
            has_api_key: profile.api_key.is_some(),
            port: profile.port,
            check_ssl_certificate: profile.check_ssl_certificate,
            check_ssl_host: profile.check_ssl_host,
            use_http_auth: profile.use_http_auth,
            is_default: config.default_profile.as_deref() == Some(name),
        }
    }
}

pub fn handle(
    command: ConfigCommand,
    config: &mut Config,
    config_path: Option<&Path>,
    renderer: &OutputRenderer,
) -> Result<()> {
    match command {
        ConfigCommand::Set(args) => set(args, config, config_path),
        ConfigCommand::Show { name } => show(name.as_deref(), config, renderer),
        ConfigCommand::List => list(config, renderer),
    }
}

fn set(args: SetArgs, config: &mut Config, config_path: Option<&Path>) -> Result<()> {
    if args.name.trim().is_empty() {
        return Err(anyhow!("Profile name cannot be empty"));
    }

    let base_url = Url::parse(&args.base_url)
        .with_context(|| format!("Invalid Redmine URL: {}", args.base_url))?;

    let entry = config.profiles.entry(args.name.clone()).or_default();
    // Url adds a trailing slash to bare hosts; request paths start with one.
    entry.base_url = Some(base_url.as_str().trim_end_matches('/').to_string());
    if let Some(api_key) = args.api_key.filter(|key| !key.trim().is_empty()) {
        entry.api_key = Some(api_key);
    }
    entry.port = args.port;
    entry.check_ssl_certificate = args.check_ssl_certificate;
    entry.check_ssl_host = args.check_ssl_host;
    entry.use_http_auth = !args.no_http_auth;

    if args.default || config.default_profile.is_none() {
        config.default_profile = Some(args.name.clone());
    }

    config
        .save(config_path)
        .context("Unable to persist configuration file")?;

    tracing::info!(profile = %args.name, base_url = %base_url, "Profile saved");
    Ok(())
}

fn show(name: Option<&str>, config: &Config, renderer: &OutputRenderer) -> Result<()> {
    let name = name
        .or(config.default_profile.as_deref())
        .ok_or_else(|| anyhow!("No profile given and no default profile configured"))?;
    let profile = config
        .profile(name)
        .ok_or_else(|| anyhow!("Profile '{name}' not found in config file."))?;

    renderer.render_value(&ProfileView::new(config, name, profile))
}

fn list(config: &Config, renderer: &OutputRenderer) -> Result<()> {
    let mut names: Vec<&String> = config.profiles.keys().collect();
    names.sort();

    let rows: Vec<ProfileView<'_>> = names
        .into_iter()
        .filter_map(|name| {
            config
                .profile(name)
                .map(|profile| ProfileView::new(config, name, profile))
        })
        .collect();

    if rows.is_empty() {
        tracing::info!("No profiles configured");
    }
    renderer.render_value(&rows)
}
