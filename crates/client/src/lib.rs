//! Typed client for the file-transfer REST API.
//!
//! Every remote action is one async method on [`TransferClient`]. The HTTP
//! layer sits behind the [`Transport`] trait so the client can be driven by
//! `reqwest` in production and by scripted mocks in tests. The bearer token
//! lives in a [`TokenCache`] backed by an injected [`TokenStore`].

pub mod client;
pub mod token;
pub mod transport;

use std::time::Duration;

pub use client::{ClientError, Response, TransferClient};
pub use token::{
    DEFAULT_TOKEN_MAX_AGE, FileTokenStore, MemoryTokenStore, Token, TokenCache, TokenStore,
    TokenStoreError, default_token_path,
};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport, TransportError};

/// Default timeout for a single HTTP call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Settings needed to talk to the API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Secret developer API key, sent as `x-api-key`.
    pub api_key: String,
    pub base_url: String,
    /// Per-call timeout for the default transport.
    pub timeout: Duration,
    /// Age after which a cached token is ignored.
    pub token_max_age: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: filedrop_protocol::constants::DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            token_max_age: DEFAULT_TOKEN_MAX_AGE,
        }
    }
}
