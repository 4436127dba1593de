//! `resilient-request` is an async typed JSON request client.
//!
//! [`RequestClient`] wraps one backend base address with ergonomic methods:
//! - [`RequestClient::get`]
//! - [`RequestClient::post`]
//! - [`RequestClient::put`]
//! - [`RequestClient::delete`]
//! - [`RequestClient::request`], the primitive the others build on
//!
//! Every call ends in the parsed value, a [`RequestError::Api`] or a
//! [`RequestError::Network`].

mod client;
mod connectivity;
mod error;
mod options;
pub mod transport;
mod wire;

pub use client::RequestClient;
pub use connectivity::{AlwaysOnline, Connectivity, ConnectivityFlag};
pub use error::{BoxError, RequestError};
pub use options::{ClientOptions, RequestOptions};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};

pub use reqwest::{header, Method, StatusCode};
pub use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, RequestError>;
