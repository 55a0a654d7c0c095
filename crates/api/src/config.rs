use url::Url;

use crate::error::{ApiError, Result};

/// Connection-level settings owned by a single [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub url: String,
    pub api_key: Option<String>,
    /// Explicit port. When `None` it is resolved from the request URL on the
    /// first request and cached here.
    pub port: Option<u16>,
    pub check_ssl_certificate: bool,
    pub check_ssl_host: bool,
    /// Send the API key as HTTP Basic credentials as well as in the header.
    pub use_http_auth: bool,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.into(),
            api_key,
            port: None,
            check_ssl_certificate: false,
            check_ssl_host: false,
            use_http_auth: true,
        }
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    pub fn with_check_ssl_certificate(mut self, check: bool) -> Self {
        self.check_ssl_certificate = check;
        self
    }

    pub fn with_check_ssl_host(mut self, check: bool) -> Self {
        self.check_ssl_host = check;
        self
    }

    pub fn with_use_http_auth(mut self, use_http_auth: bool) -> Self {
        self.use_http_auth = use_http_auth;
        self
    }

    /// Returns the effective port for `target`, caching it when it had to be
    /// inferred. Once set the port is sticky until reset with `port = None`.
    pub fn resolve_port(&mut self, target: &str) -> Result<u16> {
        if let Some(port) = self.port {
            return Ok(port);
        }
        let port = infer_port(target)?;
        self.port = Some(port);
        Ok(port)
    }
}

/// Port written in the URL, otherwise the default for `http`/`https`.
pub fn infer_port(target: &str) -> Result<u16> {
    let url = Url::parse(target)?;
    if let Some(port) = url.port() {
        return Ok(port);
    }
    match url.scheme() {
        "http" => Ok(80),
        "https" => Ok(443),
        other => Err(ApiError::UnsupportedScheme(other.to_string())),
    }
}
