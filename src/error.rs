use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

use reqwest::{Method, StatusCode};

/// Broad classification of every failure the SDK can report.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// The payload could not be turned into a request body or variable map
    Payload,
    /// The request never produced an HTTP response (connection, DNS, TLS)
    Transport,
    /// Every permitted attempt was answered with `429 Too Many Requests`
    RateLimit,
    /// The service answered with a non-successful status code
    Status,
    /// A successful response body could not be read
    Body,
    /// The GraphQL endpoint reported errors or returned no data
    GraphQl,
    /// Invalid input or configuration detected before any request was sent
    Validation,
    /// Error from a dependency that does not fit the other kinds
    Internal,
}

#[derive(Debug)]
pub struct Error {
    kind: Kind,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    backtrace: Backtrace,
}

impl Error {
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
            backtrace: Backtrace::capture(),
        }
    }

    /// Wraps `source` with a human-readable description of the stage that failed.
    pub fn wrap<S: StdError + Send + Sync + 'static>(
        kind: Kind,
        context: &'static str,
        source: S,
    ) -> Self {
        Self::with_source(
            kind,
            Context {
                context,
                source: Box::new(source),
            },
        )
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    #[must_use]
    pub fn inner(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Downcasts the direct source, looking through a [`Context`] wrapper if present.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        let source = self.source.as_deref()?;
        if let Some(found) = source.downcast_ref::<E>() {
            return Some(found);
        }

        source
            .downcast_ref::<Context>()
            .and_then(|ctx| ctx.source.downcast_ref::<E>())
    }

    pub fn validation<S: Into<String>>(reason: S) -> Self {
        Validation {
            reason: reason.into(),
        }
        .into()
    }

    #[must_use]
    pub fn status(
        status_code: StatusCode,
        method: Method,
        path: String,
        message: Option<String>,
    ) -> Self {
        Status {
            status_code,
            method,
            path,
            message,
        }
        .into()
    }

    #[must_use]
    pub fn unsupported_payload(type_name: &'static str) -> Self {
        Self::with_source(Kind::Payload, UnsupportedPayload { type_name })
    }

    #[must_use]
    pub fn rate_limited(attempts: u32) -> Self {
        Self::with_source(Kind::RateLimit, RateLimited { attempts })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(src) => write!(f, "{:?}: {}", self.kind, src),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// A stage description ("issue encoding payload", "issue sending request", ...)
/// attached to the underlying cause.
#[derive(Debug)]
pub struct Context {
    pub context: &'static str,
    source: Box<dyn StdError + Send + Sync + 'static>,
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.source)
    }
}

impl StdError for Context {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.source.as_ref())
    }
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub status_code: StatusCode,
    pub method: Method,
    pub path: String,
    /// Response body text, when it could be read
    pub message: Option<String>,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(body) => write!(
                f,
                "{} {} status code: {}, body:\n{body}",
                self.method,
                self.path,
                self.status_code.as_u16()
            ),
            None => write!(
                f,
                "{} {} status code: {}",
                self.method,
                self.path,
                self.status_code.as_u16()
            ),
        }
    }
}

impl StdError for Status {}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimited {
    pub attempts: u32,
}

impl fmt::Display for RateLimited {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rate limit exceeded after {} attempts", self.attempts)
    }
}

impl StdError for RateLimited {}

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedPayload {
    pub type_name: &'static str,
}

impl fmt::Display for UnsupportedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "payload type ({}) unsupported", self.type_name)
    }
}

impl StdError for UnsupportedPayload {}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub reason: String,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid: {}", self.reason)
    }
}

impl StdError for Validation {}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQlErrors {
    pub messages: Vec<String>,
}

impl fmt::Display for GraphQlErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.messages.is_empty() {
            return write!(f, "graphql response contained no data");
        }
        write!(f, "graphql errors: {}", self.messages.join("; "))
    }
}

impl StdError for GraphQlErrors {}

impl From<Status> for Error {
    fn from(err: Status) -> Self {
        Error::with_source(Kind::Status, err)
    }
}

impl From<Validation> for Error {
    fn from(err: Validation) -> Self {
        Error::with_source(Kind::Validation, err)
    }
}

impl From<GraphQlErrors> for Error {
    fn from(err: GraphQlErrors) -> Self {
        Error::with_source(Kind::GraphQl, err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}
