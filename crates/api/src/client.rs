use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use reqwest::{redirect, ClientBuilder, Method, RequestBuilder};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::decode::Body;
use crate::error::{ApiError, Result};
use crate::request::RequestPlan;
use crate::resources::{Resource, ResourceKind};

/// Outcome of one request: the status it observed and its decoded body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Body,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Request pipeline for one Redmine instance.
///
/// Cloning is cheap and clones share configuration, the last response code
/// and the resource cache. Requests are expected one at a time per client:
/// [`Client::response_code`] reflects whichever request finished last, while
/// each [`Response`] carries its own status.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    config: RwLock<ClientConfig>,
    response_code: Mutex<Option<u16>>,
    apis: Mutex<HashMap<ResourceKind, Arc<Resource>>>,
}

impl Client {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_config(ClientConfig::new(url, api_key))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config: RwLock::new(config),
                response_code: Mutex::new(None),
                apis: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    /// Returns the cached sub-client for `name`, creating it on first use.
    pub fn api(&self, name: &str) -> Result<Arc<Resource>> {
        let kind: ResourceKind = name.parse()?;
        let mut apis = lock(&self.inner.apis);
        let resource = apis
            .entry(kind)
            .or_insert_with(|| Arc::new(Resource::new(kind, Arc::downgrade(&self.inner))));
        Ok(Arc::clone(resource))
    }

    pub fn url(&self) -> String {
        self.config().url.clone()
    }

    /// The explicit or already resolved port, if any.
    pub fn port(&self) -> Option<u16> {
        self.config().port
    }

    /// Last HTTP status observed, `None` while no request has completed.
    pub fn response_code(&self) -> Option<u16> {
        *lock(&self.inner.response_code)
    }

    pub fn set_check_ssl_certificate(&self, check: bool) -> &Self {
        self.config_mut().check_ssl_certificate = check;
        self
    }

    pub fn set_check_ssl_host(&self, check: bool) -> &Self {
        self.config_mut().check_ssl_host = check;
        self
    }

    pub fn set_use_http_auth(&self, use_http_auth: bool) -> &Self {
        self.config_mut().use_http_auth = use_http_auth;
        self
    }

    /// `None` clears the port so the next request resolves it again.
    pub fn set_port(&self, port: Option<u16>) -> &Self {
        self.config_mut().port = port;
        self
    }

    /// GETs `path` and runs the body through the JSON decode step.
    pub async fn get(&self, path: &str) -> Result<Response> {
        let response = self.run_request(Method::GET, path, None).await?;
        Ok(Response {
            body: response.body.decode_json(),
            ..response
        })
    }

    pub async fn post(&self, path: &str, body: impl Into<Vec<u8>>) -> Result<Response> {
        self.run_request(Method::POST, path, Some(body.into())).await
    }

    pub async fn put(&self, path: &str, body: impl Into<Vec<u8>>) -> Result<Response> {
        self.run_request(Method::PUT, path, Some(body.into())).await
    }

    pub async fn delete(&self, path: &str) -> Result<Response> {
        self.run_request(Method::DELETE, path, None).await
    }

    async fn run_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Response> {
        self.set_response_code(None);

        let plan = {
            let mut config = self.config_mut();
            let target = format!("{}{}", config.url, path);
            let port = config.resolve_port(&target)?;
            RequestPlan::build(&config, port, method, path, body)?
        };

        debug!(method = %plan.method, url = %plan.url, kind = ?plan.kind, "Sending request");

        let request = build_request(&plan)?;
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                self.set_response_code(err.status().map(|s| s.as_u16()));
                warn!(error = %err, url = %plan.url, "Request failed");
                return Err(ApiError::transport(err));
            }
        };

        let status = response.status().as_u16();
        self.set_response_code(Some(status));

        let bytes = response.bytes().await.map_err(|err| {
            warn!(error = %err, status, "Failed to read response body");
            ApiError::transport(err)
        })?;

        debug!(status, len = bytes.len(), "Received response");

        Ok(Response {
            status,
            body: Body::from_transport(&bytes)?,
        })
    }

    fn set_response_code(&self, code: Option<u16>) {
        *lock(&self.inner.response_code) = code;
    }

    fn config(&self) -> std::sync::RwLockReadGuard<'_, ClientConfig> {
        self.inner
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn config_mut(&self) -> std::sync::RwLockWriteGuard<'_, ClientConfig> {
        self.inner
            .config
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.url())
            .field("port", &self.port())
            .field("response_code", &self.response_code())
            .finish()
    }
}

/// Transport settings for one request; TLS settings are only applied when
/// the plan carries them.
fn client_builder(plan: &RequestPlan) -> ClientBuilder {
    let builder = reqwest::Client::builder()
        .user_agent(format!("redmine-api/{}", env!("CARGO_PKG_VERSION")))
        .redirect(redirect::Policy::none());

    match plan.tls {
        Some(tls) => builder
            .danger_accept_invalid_certs(!tls.verify_peer)
            .danger_accept_invalid_hostnames(!tls.verify_host),
        None => builder,
    }
}

/// One transport per request.
fn build_request(plan: &RequestPlan) -> Result<RequestBuilder> {
    let http = client_builder(plan).build().map_err(ApiError::transport)?;

    let mut request = http.request(plan.method.clone(), plan.url.clone());
    for (name, value) in &plan.headers {
        request = request.header(*name, value);
    }
    if let Some(credentials) = &plan.credentials {
        request = request.basic_auth(&credentials.username, Some(&credentials.password));
    }
    if let Some(body) = &plan.body {
        request = request.body(body.clone());
    }

    Ok(request)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
