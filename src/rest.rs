//! REST dispatch with rate-limit aware retries.
//!
//! Only `429 Too Many Requests` is retried, after waiting for the number of
//! seconds advertised in `Retry-After` (1 second when absent or malformed).
//! Any other status of 300 or above fails immediately with the response body
//! attached for diagnosis.

use std::time::Duration;

use bon::Builder;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::{Method, Request, Response, StatusCode};
use url::Url;

use crate::Result;
use crate::error::{Error, Kind};
use crate::transport::Transport;

const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// A call against `{base}/api/{version}/{path}`.
#[derive(Clone, Debug, Builder)]
pub struct RestRequest {
    #[builder(default = Method::GET)]
    pub method: Method,
    #[builder(into)]
    pub path: String,
    pub body: Option<Vec<u8>>,
    #[builder(default)]
    pub query: Vec<(String, String)>,
}

#[derive(Clone, Debug)]
pub struct RestDispatcher {
    base_url: Url,
    api_version: String,
    user_agent: HeaderValue,
}

impl RestDispatcher {
    pub fn new(base_url: Url, api_version: String, user_agent: &str) -> Result<Self> {
        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|e| Error::validation(format!("invalid user agent `{user_agent}`: {e}")))?;

        Ok(Self {
            base_url,
            api_version,
            user_agent,
        })
    }

    /// Absolute URL for `path`, with `query` URL-encoded when non-empty.
    pub fn endpoint(&self, path: &str, query: &[(String, String)]) -> Result<Url> {
        let raw = format!(
            "{}/api/{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.api_version,
            path.trim_start_matches('/')
        );
        let mut url = Url::parse(&raw)
            .map_err(|e| Error::wrap(Kind::Validation, "issue building request", e))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }

    /// Sends `request` through `transport`, making at most `max_retries + 1` attempts.
    ///
    /// On success the response is returned unread; the caller owns its body.
    #[cfg_attr(
        not(feature = "tracing"),
        expect(unused_variables, reason = "`debug` only gates tracing events")
    )]
    pub async fn dispatch<T: Transport + ?Sized>(
        &self,
        transport: &T,
        request: RestRequest,
        max_retries: u32,
        debug: bool,
    ) -> Result<Response> {
        let url = self.endpoint(&request.path, &request.query)?;
        let attempts = max_retries.saturating_add(1);

        for attempt in 1..=attempts {
            #[cfg(feature = "tracing")]
            if debug {
                tracing::debug!(method = %request.method, url = %url, attempt, "sending request");
            }

            let outgoing = self.build(&request, &url);
            let response = transport
                .execute(outgoing)
                .await
                .map_err(|e| Error::wrap(Kind::Transport, "issue sending request", e))?;

            let status_code = response.status();
            if status_code.as_u16() < 300 {
                return Ok(response);
            }

            if status_code == StatusCode::TOO_MANY_REQUESTS {
                if attempt == attempts {
                    break;
                }
                let wait = retry_after(response.headers());
                drop(response);

                #[cfg(feature = "tracing")]
                tracing::warn!(
                    path = %url.path(),
                    attempt,
                    wait_secs = wait.as_secs(),
                    "rate limited, waiting before retry"
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            let message = response.text().await.ok();

            #[cfg(feature = "tracing")]
            tracing::warn!(
                status = %status_code,
                method = %request.method,
                path = %url.path(),
                "API request failed"
            );

            return Err(Error::status(
                status_code,
                request.method,
                url.path().to_owned(),
                message,
            ));
        }

        Err(Error::rate_limited(attempts))
    }

    fn build(&self, request: &RestRequest, url: &Url) -> Request {
        let mut outgoing = Request::new(request.method.clone(), url.clone());
        let headers = outgoing.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, self.user_agent.clone());
        if let Some(body) = &request.body {
            *outgoing.body_mut() = Some(body.clone().into());
        }

        outgoing
    }
}

/// Wait advertised by `Retry-After` as whole seconds, or one second.
fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map_or(DEFAULT_RETRY_AFTER, Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher(base: &str) -> RestDispatcher {
        RestDispatcher::new(
            Url::parse(base).expect("valid base"),
            "v1".to_owned(),
            "anvil-client-sdk/test",
        )
        .expect("valid dispatcher")
    }

    #[test]
    fn endpoint_joins_base_version_and_path() {
        let rest = dispatcher("https://app.useanvil.com");
        let url = rest.endpoint("/fill/abc.pdf", &[]).expect("valid url");
        assert_eq!(url.as_str(), "https://app.useanvil.com/api/v1/fill/abc.pdf");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn endpoint_encodes_query() {
        let rest = dispatcher("http://localhost:8080/");
        let url = rest
            .endpoint(
                "fill/abc.pdf",
                &[("versionNumber".to_owned(), "-1".to_owned()), ("q".to_owned(), "a b&c".to_owned())],
            )
            .expect("valid url");
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/v1/fill/abc.pdf?versionNumber=-1&q=a+b%26c"
        );
    }

    #[test]
    fn request_carries_json_content_type_and_body() {
        let rest = dispatcher("https://app.useanvil.com");
        let request = RestRequest::builder()
            .method(Method::POST)
            .path("generate-pdf")
            .body(b"{}".to_vec())
            .build();
        let url = rest.endpoint(&request.path, &request.query).expect("valid url");

        let outgoing = rest.build(&request, &url);
        assert_eq!(outgoing.method(), Method::POST);
        assert_eq!(
            outgoing.headers().get(CONTENT_TYPE),
            Some(&HeaderValue::from_static("application/json"))
        );
        assert_eq!(
            outgoing.headers().get(USER_AGENT),
            Some(&HeaderValue::from_static("anvil-client-sdk/test"))
        );
        assert_eq!(
            outgoing.body().and_then(reqwest::Body::as_bytes),
            Some(&b"{}"[..])
        );
    }

    #[test]
    fn retry_after_parses_seconds_or_defaults() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), Duration::from_secs(1));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("2"));
        assert_eq!(retry_after(&headers), Duration::from_secs(2));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after(&headers), Duration::from_secs(1));
    }
}
