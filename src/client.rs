use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::{Method, Response};

use crate::Result;
use crate::config::Config;
use crate::error::{Error, Kind};
use crate::graphql::{CreateEtchPacket, GenerateEtchSignUrl, GraphQlDispatcher, Mutation};
use crate::payload::Payload;
use crate::rest::{RestDispatcher, RestRequest};
use crate::transport::{BasicAuth, HttpTransport, Transport};
use crate::types::{EtchPacket, FillPdfPayload, GeneratePdfPayload, TemplateVersion};

/// Anvil API client.
///
/// Each client owns its own authenticated transport, so clients holding
/// different API keys never share credentials.
///
/// The debug flag may be toggled through a shared reference. Concurrent
/// toggles race with last-write-wins semantics; the flag only affects logging.
#[derive(Debug)]
pub struct Client<T = BasicAuth<HttpTransport>> {
    config: Config,
    transport: T,
    rest: RestDispatcher,
    graphql: GraphQlDispatcher,
    debug: AtomicBool,
}

impl Client {
    /// Creates a client sending requests through a fresh HTTP client.
    pub fn new(config: Config) -> Result<Self> {
        let http = HttpTransport::with_timeout(config.timeout)?;
        Self::with_http(config, http)
    }

    /// Creates a client on top of a caller-supplied HTTP transport.
    pub fn with_http(config: Config, http: HttpTransport) -> Result<Self> {
        let transport = BasicAuth::new(http, &config.api_key)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> Client<T> {
    /// Creates a client with a fully assembled transport. Authentication is
    /// entirely the transport's responsibility here.
    pub fn with_transport(config: Config, transport: T) -> Result<Self> {
        let rest = RestDispatcher::new(
            config.base_url.clone(),
            config.rest_api_version.clone(),
            &config.user_agent,
        )?;
        let graphql = GraphQlDispatcher::new(config.graphql_url.clone(), &config.user_agent)?;
        let debug = AtomicBool::new(config.debug);

        Ok(Self {
            config,
            transport,
            rest,
            graphql,
            debug,
        })
    }

    /// Configuration the client was built with. Its `debug` field is the
    /// initial value only; see [`Client::debug`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current debug flag, including changes made through [`Client::set_debug`].
    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    pub fn set_debug(&self, debug: bool) {
        self.debug.store(debug, Ordering::Relaxed);
    }

    /// Fills PDF template `template_id` with `payload`.
    ///
    /// Without a `version` the service uses the latest published template version.
    pub async fn fill_pdf<P>(
        &self,
        template_id: &str,
        version: Option<TemplateVersion>,
        payload: P,
    ) -> Result<Vec<u8>>
    where
        P: Into<Payload<FillPdfPayload>>,
    {
        let body = payload.into().into_body().await?;
        let query = version
            .map(|v| vec![("versionNumber".to_owned(), v.query_value())])
            .unwrap_or_default();

        let request = RestRequest::builder()
            .method(Method::POST)
            .path(format!("fill/{template_id}.pdf"))
            .body(body)
            .query(query)
            .build();

        self.fetch(request).await
    }

    /// Generates a new PDF from markdown or HTML.
    pub async fn generate_pdf<P>(&self, payload: P) -> Result<Vec<u8>>
    where
        P: Into<Payload<GeneratePdfPayload>>,
    {
        let body = payload.into().into_body().await?;
        let request = RestRequest::builder()
            .method(Method::POST)
            .path("generate-pdf")
            .body(body)
            .build();

        self.fetch(request).await
    }

    /// Downloads every completed document of a document group as one zip archive.
    pub async fn download_documents(&self, document_group_eid: &str) -> Result<Vec<u8>> {
        let request = RestRequest::builder()
            .method(Method::GET)
            .path(format!("document-group/{document_group_eid}.zip"))
            .build();

        self.fetch(request).await
    }

    /// Creates an Etch signature packet and returns its identifier.
    ///
    /// `payload` must be a JSON object (as a map, text, bytes or a stream)
    /// matching the `createEtchPacket` arguments.
    pub async fn create_etch_packet<P>(&self, payload: P) -> Result<String>
    where
        P: Into<Payload>,
    {
        let variables = payload.into().into_variables().await?;
        let packet: EtchPacket = self.mutate(&CreateEtchPacket::new(variables)?).await?;

        Ok(packet.eid)
    }

    /// Generates the URL a signer follows to sign their part of a packet.
    pub async fn generate_etch_sign_url(
        &self,
        signer_eid: &str,
        client_user_id: &str,
    ) -> Result<String> {
        self.mutate(&GenerateEtchSignUrl::new(signer_eid, client_user_id))
            .await
    }

    /// Dispatches an arbitrary REST call with the configured retry budget.
    ///
    /// The returned response is unread; the caller owns its body.
    pub async fn rest_request(&self, request: RestRequest) -> Result<Response> {
        self.rest
            .dispatch(
                &self.transport,
                request,
                self.config.max_retries,
                self.debug(),
            )
            .await
    }

    /// Runs a single GraphQL mutation without retries.
    pub async fn mutate<M: Mutation>(&self, mutation: &M) -> Result<M::Output> {
        self.graphql
            .mutate(&self.transport, mutation, self.debug())
            .await
    }

    async fn fetch(&self, request: RestRequest) -> Result<Vec<u8>> {
        let response = self.rest_request(request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::wrap(Kind::Body, "issue reading response body", e))?;

        Ok(bytes.to_vec())
    }
}
