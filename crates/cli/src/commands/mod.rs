use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use redmine_api::{Client, Response};

use crate::output::OutputRenderer;

pub mod config;
mod resource;

pub use resource::ResourceArgs;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// GET a path and decode the response
    Get {
        /// Request path, e.g. /issues.json?project_id=1
        path: String,
    },
    /// POST a body to a path
    Post {
        path: String,
        #[command(flatten)]
        body: BodyArgs,
    },
    /// PUT a body to a path
    Put {
        path: String,
        #[command(flatten)]
        body: BodyArgs,
    },
    /// DELETE a path
    Delete { path: String },
    /// Upload a file and print the upload token
    Upload {
        /// File to upload
        file: PathBuf,
    },
    /// Call a resource client (issue, project, user, ...)
    Resource(ResourceArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BodyArgs {
    /// Request body given inline
    #[arg(long, conflicts_with = "file")]
    data: Option<String>,

    /// Read the request body from a file
    #[arg(long)]
    file: Option<PathBuf>,
}

impl BodyArgs {
    fn read(&self) -> Result<Vec<u8>> {
        match (&self.data, &self.file) {
            (Some(data), _) => Ok(data.clone().into_bytes()),
            (None, Some(file)) => std::fs::read(file)
                .with_context(|| format!("Unable to read request body from {}", file.display())),
            (None, None) => Ok(Vec::new()),
        }
    }
}

pub async fn execute(command: Command, client: Client, renderer: &OutputRenderer) -> Result<()> {
    let response = match command {
        Command::Get { path } => client.get(&path).await?,
        Command::Post { path, body } => client.post(&path, body.read()?).await?,
        Command::Put { path, body } => client.put(&path, body.read()?).await?,
        Command::Delete { path } => client.delete(&path).await?,
        Command::Upload { file } => {
            let content = std::fs::read(&file)
                .with_context(|| format!("Unable to read {}", file.display()))?;
            client
                .api("attachment")?
                .upload(content)
                .await
                .with_context(|| format!("Failed to upload {}", file.display()))?
        }
        Command::Resource(args) => match resource::execute(args, &client).await? {
            Some(response) => response,
            None => return Ok(()),
        },
    };

    finish(response, renderer)
}

/// Prints the status on stderr and the body on stdout, and turns a
/// non-success status into the exit code.
fn finish(response: Response, renderer: &OutputRenderer) -> Result<()> {
    eprintln!("HTTP {}", response.status);
    renderer.render(&response.body)?;

    if !response.is_success() {
        bail!("Server responded with HTTP {}", response.status);
    }
    Ok(())
}
