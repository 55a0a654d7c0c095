//! Client library for the Redmine REST API.
//!
//! [`Client`] runs every request through one pipeline: port resolution,
//! content-type negotiation from the path suffix, API key authentication,
//! the HTTP exchange and a best-effort decode of the body into [`Body`].
//! Resource sub-clients returned by [`Client::api`] only build paths on top
//! of the four verbs. [`blocking::Client`] offers the same pipeline as
//! blocking calls.

pub mod blocking;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod request;
pub mod resources;
pub mod xml;

pub use client::{Client, Response};
pub use config::ClientConfig;
pub use decode::{Body, JsonDecodeError, JsonErrorKind, MAX_JSON_DEPTH};
pub use error::{ApiError, Result, TransportKind};
pub use request::{RequestKind, RequestPlan};
pub use resources::{Resource, ResourceKind};
pub use xml::XmlElement;
