//! Synchronous facade over [`crate::Client`].
//!
//! Each call blocks the current thread for the full round trip. The facade
//! owns a current-thread runtime, so it must not be used from inside an
//! async context.

use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::resources::Resource;
use crate::Response;

pub struct Client {
    inner: crate::Client,
    runtime: Runtime,
}

impl Client {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        Self::with_config(ClientConfig::new(url, api_key))
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ApiError::Runtime)?;

        Ok(Self {
            inner: crate::Client::with_config(config),
            runtime,
        })
    }

    pub fn get(&self, path: &str) -> Result<Response> {
        self.runtime.block_on(self.inner.get(path))
    }

    pub fn post(&self, path: &str, body: impl Into<Vec<u8>>) -> Result<Response> {
        self.runtime.block_on(self.inner.post(path, body))
    }

    pub fn put(&self, path: &str, body: impl Into<Vec<u8>>) -> Result<Response> {
        self.runtime.block_on(self.inner.put(path, body))
    }

    pub fn delete(&self, path: &str) -> Result<Response> {
        self.runtime.block_on(self.inner.delete(path))
    }

    /// Cached sub-client; drive its futures with [`Client::block_on`].
    pub fn api(&self, name: &str) -> Result<Arc<Resource>> {
        self.inner.api(name)
    }

    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn response_code(&self) -> Option<u16> {
        self.inner.response_code()
    }

    pub fn url(&self) -> String {
        self.inner.url()
    }

    pub fn port(&self) -> Option<u16> {
        self.inner.port()
    }

    pub fn set_check_ssl_certificate(&self, check: bool) -> &Self {
        self.inner.set_check_ssl_certificate(check);
        self
    }

    pub fn set_check_ssl_host(&self, check: bool) -> &Self {
        self.inner.set_check_ssl_host(check);
        self
    }

    pub fn set_use_http_auth(&self, use_http_auth: bool) -> &Self {
        self.inner.set_use_http_auth(use_http_auth);
        self
    }

    pub fn set_port(&self, port: Option<u16>) -> &Self {
        self.inner.set_port(port);
        self
    }

    /// The async client sharing this facade's state.
    pub fn async_client(&self) -> &crate::Client {
        &self.inner
    }
}
