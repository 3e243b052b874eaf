//! GraphQL mutations against the single Anvil GraphQL endpoint.
//!
//! Mutations are not retried; transport and service errors propagate as-is.

use reqwest::header::{CONTENT_TYPE, HeaderValue, USER_AGENT};
use reqwest::{Method, Request};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::Result;
use crate::error::{Error, GraphQlErrors, Kind};
use crate::payload::Variables;
use crate::transport::Transport;
use crate::types::EtchPacket;

/// A typed mutation: its document, its variables and the shape of its result.
pub trait Mutation {
    type Output: DeserializeOwned;

    /// Field under `data` holding the result.
    const FIELD: &'static str;

    fn document(&self) -> String;

    fn variables(&self) -> &Variables;
}

/// Arguments accepted by `createEtchPacket`, with their GraphQL types.
const ETCH_PACKET_ARGUMENTS: &[(&str, &str)] = &[
    ("name", "String"),
    ("files", "[EtchFile!]"),
    ("isDraft", "Boolean"),
    ("isTest", "Boolean"),
    ("signatureEmailSubject", "String"),
    ("signatureEmailBody", "String"),
    ("signatureProvider", "String"),
    ("signaturePageOptions", "JSON"),
    ("signers", "[JSON]"),
    ("data", "JSON"),
];

/// `createEtchPacket` with whichever arguments the caller supplied.
#[derive(Clone, Debug)]
pub struct CreateEtchPacket {
    variables: Variables,
}

impl CreateEtchPacket {
    /// Rejects variable names the mutation does not declare.
    pub fn new(variables: Variables) -> Result<Self> {
        if let Some(unknown) = variables
            .keys()
            .find(|key| !ETCH_PACKET_ARGUMENTS.iter().any(|(name, _)| *name == key.as_str()))
        {
            return Err(Error::validation(format!(
                "unsupported createEtchPacket argument `{unknown}`"
            )));
        }

        Ok(Self { variables })
    }
}

impl Mutation for CreateEtchPacket {
    type Output = EtchPacket;

    const FIELD: &'static str = "createEtchPacket";

    fn document(&self) -> String {
        let present: Vec<_> = ETCH_PACKET_ARGUMENTS
            .iter()
            .filter(|(name, _)| self.variables.contains_key(*name))
            .collect();

        let declarations = present
            .iter()
            .map(|(name, ty)| format!("${name}: {ty}"))
            .collect::<Vec<_>>()
            .join(", ");
        let arguments = present
            .iter()
            .map(|(name, _)| format!("{name}: ${name}"))
            .collect::<Vec<_>>()
            .join(", ");

        if present.is_empty() {
            format!("mutation CreateEtchPacket {{ {} {{ eid name detailsURL }} }}", Self::FIELD)
        } else {
            format!(
                "mutation CreateEtchPacket({declarations}) {{ {}({arguments}) {{ eid name detailsURL }} }}",
                Self::FIELD
            )
        }
    }

    fn variables(&self) -> &Variables {
        &self.variables
    }
}

/// `generateEtchSignURL` for one signer.
#[derive(Clone, Debug)]
pub struct GenerateEtchSignUrl {
    variables: Variables,
}

impl GenerateEtchSignUrl {
    #[must_use]
    pub fn new(signer_eid: &str, client_user_id: &str) -> Self {
        let mut variables = Map::new();
        variables.insert("signerEid".to_owned(), Value::from(signer_eid));
        variables.insert("clientUserId".to_owned(), Value::from(client_user_id));
        Self { variables }
    }
}

impl Mutation for GenerateEtchSignUrl {
    type Output = String;

    const FIELD: &'static str = "generateEtchSignURL";

    fn document(&self) -> String {
        format!(
            "mutation GenerateEtchSignURL($signerEid: String!, $clientUserId: String!) {{ {}(signerEid: $signerEid, clientUserId: $clientUserId) }}",
            Self::FIELD
        )
    }

    fn variables(&self) -> &Variables {
        &self.variables
    }
}

#[derive(Serialize)]
struct Operation<'a> {
    query: String,
    variables: &'a Variables,
}

#[derive(Deserialize)]
struct Envelope {
    data: Option<Map<String, Value>>,
    #[serde(default)]
    errors: Vec<ResponseError>,
}

#[derive(Deserialize)]
struct ResponseError {
    message: String,
}

#[derive(Clone, Debug)]
pub struct GraphQlDispatcher {
    endpoint: Url,
    user_agent: HeaderValue,
}

impl GraphQlDispatcher {
    pub fn new(endpoint: Url, user_agent: &str) -> Result<Self> {
        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|e| Error::validation(format!("invalid user agent `{user_agent}`: {e}")))?;
        Ok(Self {
            endpoint,
            user_agent,
        })
    }

    /// Sends `mutation` once and decodes its result field.
    #[cfg_attr(
        not(feature = "tracing"),
        expect(unused_variables, reason = "`debug` only gates tracing events")
    )]
    pub async fn mutate<M: Mutation, T: Transport + ?Sized>(
        &self,
        transport: &T,
        mutation: &M,
        debug: bool,
    ) -> Result<M::Output> {
        let operation = Operation {
            query: mutation.document(),
            variables: mutation.variables(),
        };

        #[cfg(feature = "tracing")]
        if debug {
            tracing::debug!(endpoint = %self.endpoint, query = %operation.query, "sending mutation");
        }

        let mut request = Request::new(Method::POST, self.endpoint.clone());
        let headers = request.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, self.user_agent.clone());
        *request.body_mut() = Some(serde_json::to_vec(&operation)?.into());

        let response = transport
            .execute(request)
            .await
            .map_err(|e| Error::wrap(Kind::Transport, "issue sending request", e))?;

        let status_code = response.status();
        if !status_code.is_success() {
            let message = response.text().await.ok();
            return Err(Error::status(
                status_code,
                Method::POST,
                self.endpoint.path().to_owned(),
                message,
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::wrap(Kind::Body, "issue reading response body", e))?;

        decode::<M>(&body)
    }
}

fn decode<M: Mutation>(body: &[u8]) -> Result<M::Output> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| Error::wrap(Kind::GraphQl, "issue decoding response", e))?;

    if !envelope.errors.is_empty() {
        return Err(GraphQlErrors {
            messages: envelope.errors.into_iter().map(|e| e.message).collect(),
        }
        .into());
    }

    let field = envelope
        .data
        .and_then(|mut data| data.remove(M::FIELD))
        .filter(|value| !value.is_null())
        .ok_or(GraphQlErrors { messages: Vec::new() })?;

    serde_path_to_error::deserialize(field)
        .map_err(|e| Error::wrap(Kind::GraphQl, "issue decoding response", e))
}
