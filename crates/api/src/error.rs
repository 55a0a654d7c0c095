use std::fmt;

use thiserror::Error;

/// Coarse classification of a transport failure, derived from the
/// underlying HTTP client error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Connect,
    Timeout,
    Redirect,
    Body,
    Builder,
    Request,
    Other,
}

impl TransportKind {
    pub fn of(err: &reqwest::Error) -> Self {
        if err.is_connect() {
            TransportKind::Connect
        } else if err.is_timeout() {
            TransportKind::Timeout
        } else if err.is_redirect() {
            TransportKind::Redirect
        } else if err.is_body() || err.is_decode() {
            TransportKind::Body
        } else if err.is_builder() {
            TransportKind::Builder
        } else if err.is_request() {
            TransportKind::Request
        } else {
            TransportKind::Other
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransportKind::Connect => "connect",
            TransportKind::Timeout => "timeout",
            TransportKind::Redirect => "redirect",
            TransportKind::Body => "body",
            TransportKind::Builder => "builder",
            TransportKind::Request => "request",
            TransportKind::Other => "other",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP transport failed ({kind}): {source}")]
    Transport {
        kind: TransportKind,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unknown API resource: {name}")]
    InvalidArgument { name: String },

    #[error("Resource '{resource}' does not support {operation}")]
    UnsupportedOperation {
        resource: &'static str,
        operation: &'static str,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid XML response: {0}")]
    Xml(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("The client backing this resource has been dropped")]
    ClientClosed,

    #[error("Unable to start blocking runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl ApiError {
    pub(crate) fn transport(source: reqwest::Error) -> Self {
        ApiError::Transport {
            kind: TransportKind::of(&source),
            source,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }

    pub fn suggestion(&self) -> Option<&str> {
        match self {
            ApiError::Transport {
                kind: TransportKind::Connect,
                ..
            } => Some("Check that the Redmine URL is reachable from this machine"),
            ApiError::Transport {
                kind: TransportKind::Timeout,
                ..
            } => Some("Check your network connection or try again later"),
            ApiError::InvalidArgument { .. } => {
                Some("Use one of the resource names listed by `redmine-cli resource --help`")
            }
            ApiError::UnsupportedScheme(_) | ApiError::InvalidUrl(_) => {
                Some("The base URL must start with http:// or https://")
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
