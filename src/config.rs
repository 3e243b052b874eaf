use std::env;
use std::time::Duration;

use bon::Builder;
use secrecy::SecretString;
use url::Url;

use crate::Result;
use crate::error::Error;

pub const DEFAULT_REST_API_VERSION: &str = "v1";
pub const DEFAULT_BASE_URL: &str = "https://app.useanvil.com";
pub const DEFAULT_GRAPHQL_URL: &str = "https://graphql.useanvil.com";
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const CLIENT_ID: &str = "anvil-client-sdk";

pub const API_KEY_VAR: &str = "ANVIL_API_KEY";
pub const BASE_URL_VAR: &str = "ANVIL_BASE_URL";
pub const GRAPHQL_URL_VAR: &str = "ANVIL_GRAPHQL_URL";
pub const REST_API_VERSION_VAR: &str = "ANVIL_REST_API_VERSION";

/// Connection settings for a [`crate::Client`].
///
/// The API key is held as a [`SecretString`] so it never shows up in `Debug` output.
#[derive(Clone, Debug, Builder)]
pub struct Config {
    #[builder(into)]
    pub api_key: SecretString,
    #[builder(into, default = DEFAULT_REST_API_VERSION.to_owned())]
    pub rest_api_version: String,
    #[builder(default = default_url(DEFAULT_BASE_URL))]
    pub base_url: Url,
    #[builder(default = default_url(DEFAULT_GRAPHQL_URL))]
    pub graphql_url: Url,
    #[builder(into, default = user_agent(CLIENT_ID, Some(env!("CARGO_PKG_VERSION"))))]
    pub user_agent: String,
    /// Extra attempts granted to a rate-limited REST call.
    #[builder(default = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,
    /// Per-request deadline enforced by the HTTP client. `None` leaves it unbounded.
    pub timeout: Option<Duration>,
    /// Initial debug flag. A [`Client`](crate::Client) copies it at construction;
    /// afterwards [`Client::debug`](crate::Client::debug) is authoritative.
    #[builder(default)]
    pub debug: bool,
}

impl Config {
    /// Loads the configuration from `ANVIL_*` environment variables.
    ///
    /// `ANVIL_API_KEY` is required; the URL and version variables override the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                Error::validation(format!("${API_KEY_VAR} must be defined in your environment"))
            })?;

        let base_url = lookup(BASE_URL_VAR)
            .map(|raw| parse_url(BASE_URL_VAR, &raw))
            .transpose()?;
        let graphql_url = lookup(GRAPHQL_URL_VAR)
            .map(|raw| parse_url(GRAPHQL_URL_VAR, &raw))
            .transpose()?;

        Ok(Self::builder()
            .api_key(api_key)
            .maybe_rest_api_version(lookup(REST_API_VERSION_VAR))
            .maybe_base_url(base_url)
            .maybe_graphql_url(graphql_url)
            .build())
    }
}

/// Builds a User-Agent value from a client identifier and an optional version suffix.
#[must_use]
pub fn user_agent(client_id: &str, version: Option<&str>) -> String {
    match version {
        Some(version) if !version.is_empty() => format!("{client_id}/{version}"),
        _ => client_id.to_owned(),
    }
}

fn parse_url(var: &str, raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::validation(format!("invalid ${var} `{raw}`: {e}")))
}

#[expect(
    clippy::unwrap_used,
    reason = "the default URLs are compile-time constants that always parse"
)]
fn default_url(raw: &str) -> Url {
    Url::parse(raw).unwrap()
}
