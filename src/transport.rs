//! HTTP transports.
//!
//! [`HttpTransport`] sends requests through a [`reqwest::Client`] owned by one
//! SDK client. [`BasicAuth`] decorates any [`Transport`] so every outgoing
//! request carries `Authorization: Basic base64(api_key + ":")`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Request, Response};
use secrecy::{ExposeSecret as _, SecretString};

use crate::Result;
use crate::error::Error;

/// Executes one HTTP request.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn execute(&self, request: Request) -> reqwest::Result<Response>;
}

#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Builds a dedicated HTTP client, applying `timeout` when given.
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::new(builder.build()?))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: Request) -> reqwest::Result<Response> {
        self.client.execute(request).await
    }
}

/// Signs requests with HTTP Basic auth: API key as username, empty password.
#[derive(Clone)]
pub struct BasicAuth<T> {
    inner: T,
    header: HeaderValue,
}

impl<T> BasicAuth<T> {
    pub fn new(inner: T, api_key: &SecretString) -> Result<Self> {
        let encoded = STANDARD.encode(format!("{}:", api_key.expose_secret()));
        let mut header = HeaderValue::from_str(&format!("Basic {encoded}"))
            .map_err(|e| Error::validation(format!("api key is not a valid header value: {e}")))?;
        header.set_sensitive(true);

        Ok(Self { inner, header })
    }
}

impl<T: fmt::Debug> fmt::Debug for BasicAuth<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("inner", &self.inner)
            .field("header", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl<T: Transport> Transport for BasicAuth<T> {
    async fn execute(&self, mut request: Request) -> reqwest::Result<Response> {
        request
            .headers_mut()
            .insert(AUTHORIZATION, self.header.clone());
        self.inner.execute(request).await
    }
}
