//! Requests described as plain data.
//!
//! [`RequestPlan::build`] turns the client configuration and one call's
//! arguments into everything the transport needs: target URL, headers,
//! credentials and TLS options. Nothing here touches the network, so the
//! negotiation rules can be tested without a server.

use rand::Rng;
use reqwest::Method;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};

pub const API_KEY_HEADER: &str = "X-Redmine-API-Key";

/// Request paths that carry raw file content.
pub const UPLOAD_PATHS: [&str; 2] = ["/uploads.json", "/uploads.xml"];

const PLAIN_HTTP_PORT: u16 = 80;

/// Payload format of a request, derived from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Json,
    Xml,
    Upload,
    Other,
}

impl RequestKind {
    /// Applies the rules in order, the last matching rule wins: `.xml`
    /// suffix, `.json` suffix, then the literal upload endpoints.
    pub fn detect(path: &str, url_path: &str) -> Self {
        let mut kind = RequestKind::Other;
        if url_path.ends_with(".xml") {
            kind = RequestKind::Xml;
        }
        if url_path.ends_with(".json") {
            kind = RequestKind::Json;
        }
        if UPLOAD_PATHS.contains(&path) {
            kind = RequestKind::Upload;
        }
        kind
    }

    pub fn content_type(self) -> Option<&'static str> {
        match self {
            RequestKind::Json => Some("application/json"),
            RequestKind::Xml => Some("text/xml"),
            RequestKind::Upload => Some("application/octet-stream"),
            RequestKind::Other => None,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

impl BasicCredentials {
    /// The server authenticates on the key alone; the password slot only has
    /// to be filled.
    pub fn for_api_key(api_key: &str) -> Self {
        let password: u32 = rand::thread_rng().gen_range(100_000..=199_999);
        Self {
            username: api_key.to_string(),
            password: password.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsOptions {
    pub verify_peer: bool,
    pub verify_host: bool,
}

#[derive(Debug, Clone)]
pub struct RequestPlan {
    pub method: Method,
    pub url: Url,
    pub port: u16,
    pub kind: RequestKind,
    pub headers: Vec<(&'static str, String)>,
    pub credentials: Option<BasicCredentials>,
    /// `None` on port 80, where TLS settings are left untouched.
    pub tls: Option<TlsOptions>,
    pub body: Option<Vec<u8>>,
}

impl RequestPlan {
    pub fn build(
        config: &ClientConfig,
        port: u16,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Self> {
        let target = format!("{}{}", config.url, path);
        let mut url = Url::parse(&target)?;
        if url.port_or_known_default() != Some(port) {
            url.set_port(Some(port))
                .map_err(|()| ApiError::UnsupportedScheme(url.scheme().to_string()))?;
        }

        let kind = RequestKind::detect(path, url.path());

        let mut headers = Vec::new();
        if let Some(content_type) = kind.content_type() {
            headers.push(("Content-Type", content_type.to_string()));
            if let Some(key) = &config.api_key {
                headers.push((API_KEY_HEADER, key.clone()));
            }
        }

        let credentials = match &config.api_key {
            Some(key) if config.use_http_auth => Some(BasicCredentials::for_api_key(key)),
            _ => None,
        };

        let tls = (port != PLAIN_HTTP_PORT).then_some(TlsOptions {
            verify_peer: config.check_ssl_certificate,
            verify_host: config.check_ssl_host,
        });

        let body = if method == Method::POST || method == Method::PUT {
            body
        } else {
            None
        };

        Ok(Self {
            method,
            url,
            port,
            kind,
            headers,
            credentials,
            tls,
            body,
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
