//! Request payload shapes and their normalization.
//!
//! Every operation accepts exactly one [`Payload`] variant. REST calls turn it
//! into a request body with [`Payload::into_body`]; GraphQL mutations turn it
//! into a variable map with [`Payload::into_variables`].

use std::any::type_name;
use std::fmt;

use futures::io::{AsyncRead, AsyncReadExt as _};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::Result;
use crate::error::{Error, Kind};

pub type Variables = Map<String, Value>;

/// A request payload in one of the admissible shapes.
///
/// `R` is the structured record accepted by the operation, for example
/// [`crate::types::FillPdfPayload`].
#[non_exhaustive]
pub enum Payload<R = Value> {
    /// Typed record, serialized to JSON.
    Record(R),
    /// Raw JSON object, serialized to JSON.
    Mapping(Map<String, Value>),
    /// Pre-encoded text, sent verbatim.
    Text(String),
    /// Pre-encoded bytes, sent verbatim.
    Bytes(Vec<u8>),
    /// Stream drained fully before the request is sent.
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

impl<R> Payload<R> {
    pub fn reader<T: AsyncRead + Send + Unpin + 'static>(reader: T) -> Self {
        Payload::Reader(Box::new(reader))
    }

    /// Produces the bytes to send as a REST request body.
    pub async fn into_body(self) -> Result<Vec<u8>>
    where
        R: Serialize,
    {
        match self {
            Payload::Record(record) => encode(&record),
            Payload::Mapping(map) => encode(&map),
            Payload::Text(text) => Ok(text.into_bytes()),
            Payload::Bytes(bytes) => Ok(bytes),
            Payload::Reader(reader) => drain(reader).await,
        }
    }

    /// Produces the variable map for a GraphQL mutation.
    ///
    /// Typed records are REST bodies and are rejected here; text, bytes and
    /// streams must decode to a JSON object.
    pub async fn into_variables(self) -> Result<Variables> {
        match self {
            Payload::Record(_) => Err(Error::unsupported_payload(type_name::<R>())),
            Payload::Mapping(map) => Ok(map),
            Payload::Text(text) => parse(text.as_bytes()),
            Payload::Bytes(bytes) => parse(&bytes),
            Payload::Reader(reader) => parse(&drain(reader).await?),
        }
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Payload::Record(_) => "Record",
            Payload::Mapping(_) => "Mapping",
            Payload::Text(_) => "Text",
            Payload::Bytes(_) => "Bytes",
            Payload::Reader(_) => "Reader",
        }
    }
}

impl<R> fmt::Debug for Payload<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Payload").field(&self.variant_name()).finish()
    }
}

impl<R> From<Map<String, Value>> for Payload<R> {
    fn from(value: Map<String, Value>) -> Self {
        Payload::Mapping(value)
    }
}

impl<R> From<String> for Payload<R> {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl<R> From<&str> for Payload<R> {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_owned())
    }
}

impl<R> From<Vec<u8>> for Payload<R> {
    fn from(value: Vec<u8>) -> Self {
        Payload::Bytes(value)
    }
}

impl<R> From<&[u8]> for Payload<R> {
    fn from(value: &[u8]) -> Self {
        Payload::Bytes(value.to_vec())
    }
}

impl From<crate::types::FillPdfPayload> for Payload<crate::types::FillPdfPayload> {
    fn from(value: crate::types::FillPdfPayload) -> Self {
        Payload::Record(value)
    }
}

impl From<crate::types::GeneratePdfPayload> for Payload<crate::types::GeneratePdfPayload> {
    fn from(value: crate::types::GeneratePdfPayload) -> Self {
        Payload::Record(value)
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| Error::wrap(Kind::Payload, "issue encoding payload", e))
}

fn parse(bytes: &[u8]) -> Result<Variables> {
    serde_json::from_slice(bytes).map_err(|e| Error::wrap(Kind::Payload, "issue parsing payload", e))
}

async fn drain(mut reader: Box<dyn AsyncRead + Send + Unpin>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader
        .read_to_end(&mut buf)
        .await
        .map_err(|e| Error::wrap(Kind::Payload, "issue reading payload", e))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context as TaskContext, Poll};

    use futures::executor::block_on;
    use futures::io::Cursor;
    use serde::Serializer;
    use serde_json::json;

    use super::*;
    use crate::error::{Context, UnsupportedPayload};
    use crate::types::FillPdfPayload;

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("cannot encode"))
        }
    }

    struct BrokenReader;

    impl AsyncRead for BrokenReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut TaskContext<'_>,
            _buf: &mut [u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed")))
        }
    }

    fn context_of(err: &Error) -> &'static str {
        err.downcast_ref::<Context>()
            .map(|ctx| ctx.context)
            .unwrap_or_default()
    }

    #[test]
    fn record_is_json_encoded() {
        let mut data = Map::new();
        data.insert("name".to_owned(), json!("Ada"));
        let payload: Payload<FillPdfPayload> = FillPdfPayload::builder().data(data).build().into();

        let body = block_on(payload.into_body()).expect("encodes");
        assert_eq!(body, br#"{"data":{"name":"Ada"}}"#.to_vec());
    }

    #[test]
    fn mapping_is_json_encoded() {
        let map = json!({ "data": { "a": 1 } })
            .as_object()
            .cloned()
            .expect("object literal");
        let body = block_on(Payload::<FillPdfPayload>::from(map).into_body()).expect("encodes");
        assert_eq!(body, br#"{"data":{"a":1}}"#.to_vec());
    }

    #[test]
    fn text_and_bytes_pass_through_unchanged() {
        let text = block_on(Payload::<Value>::from("not even json").into_body()).expect("text");
        assert_eq!(text, b"not even json".to_vec());

        let raw = vec![0x25, 0x50, 0x44, 0x46, 0xff];
        let bytes = block_on(Payload::<Value>::from(raw.clone()).into_body()).expect("bytes");
        assert_eq!(bytes, raw);
    }

    #[test]
    fn reader_is_drained() {
        let payload = Payload::<Value>::reader(Cursor::new(b"{\"data\":{}}".to_vec()));
        let body = block_on(payload.into_body()).expect("drains");
        assert_eq!(body, b"{\"data\":{}}".to_vec());
    }

    #[test]
    fn encoding_failure_is_wrapped() {
        let err = block_on(Payload::Record(Unencodable).into_body()).unwrap_err();
        assert_eq!(err.kind(), Kind::Payload);
        assert_eq!(context_of(&err), "issue encoding payload");
        assert!(
            err.to_string().contains("cannot encode"),
            "cause missing from: {err}"
        );
    }

    #[test]
    fn read_failure_is_wrapped() {
        let err = block_on(Payload::<Value>::reader(BrokenReader).into_body()).unwrap_err();
        assert_eq!(err.kind(), Kind::Payload);
        assert_eq!(context_of(&err), "issue reading payload");
        let cause = err.downcast_ref::<io::Error>().expect("io cause preserved");
        assert_eq!(cause.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn variables_from_text_bytes_and_reader() {
        let expected = json!({ "name": "Doc", "isTest": true });
        let raw = expected.to_string();

        let from_text = block_on(Payload::<Value>::from(raw.as_str()).into_variables());
        let from_bytes = block_on(Payload::<Value>::from(raw.as_bytes()).into_variables());
        let from_reader =
            block_on(Payload::<Value>::reader(Cursor::new(raw.clone().into_bytes())).into_variables());

        for vars in [from_text, from_bytes, from_reader] {
            assert_eq!(Value::Object(vars.expect("parses")), expected);
        }
    }

    #[test]
    fn variables_reject_non_object_json() {
        let err = block_on(Payload::<Value>::from("[1, 2]").into_variables()).unwrap_err();
        assert_eq!(err.kind(), Kind::Payload);
        assert_eq!(context_of(&err), "issue parsing payload");
    }

    #[test]
    fn variables_reject_typed_records() {
        let payload: Payload<FillPdfPayload> = FillPdfPayload::default().into();
        let err = block_on(payload.into_variables()).unwrap_err();

        assert_eq!(err.kind(), Kind::Payload);
        let unsupported = err
            .downcast_ref::<UnsupportedPayload>()
            .expect("unsupported payload source");
        assert!(
            unsupported.type_name.ends_with("FillPdfPayload"),
            "type name should identify the record: {}",
            unsupported.type_name
        );
    }
}
