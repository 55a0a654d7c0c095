use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use redmine_api::{Client, Response};

#[derive(Args, Debug, Clone)]
pub struct ResourceArgs {
    /// Resource name: attachment, group, custom_fields, issue, issue_category,
    /// issue_priority, issue_relation, issue_status, membership, news, project,
    /// query, role, time_entry, time_entry_activity, tracker, user, version, wiki
    name: String,

    #[command(subcommand)]
    action: ResourceAction,
}

#[derive(Subcommand, Debug, Clone)]
enum ResourceAction {
    /// List items, optionally scoped to a parent (project or issue)
    List {
        /// Parent identifier for nested collections
        #[arg(long)]
        parent: Option<String>,

        /// Query parameter as key=value (repeatable)
        #[arg(long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
    /// Fetch a single item
    Show {
        id: String,
        /// Parent identifier, required for wiki pages
        #[arg(long)]
        parent: Option<String>,
    },
    /// Delete an item
    Remove { id: String },
    /// Print the browser link of an item
    Link { id: String },
}

/// Runs the action; `None` when it printed its own output.
pub async fn execute(args: ResourceArgs, client: &Client) -> Result<Option<Response>> {
    let resource = client
        .api(&args.name)
        .with_context(|| format!("Cannot use resource '{}'", args.name))?;

    let response = match args.action {
        ResourceAction::List { parent, params } => {
            let params: Vec<(&str, &str)> = params
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            match parent {
                Some(parent) => resource.list_in(parent, &params).await?,
                None => resource.list(&params).await?,
            }
        }
        ResourceAction::Show { id, parent } => match parent {
            Some(parent) => resource.show_in(parent, id).await?,
            None => resource.show(id).await?,
        },
        ResourceAction::Remove { id } => resource.remove(id).await?,
        ResourceAction::Link { id } => {
            println!("{}", resource.link(id)?);
            return Ok(None);
        }
    };

    Ok(Some(response))
}

fn parse_key_val(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    Ok((key.to_string(), value.to_string()))
}
