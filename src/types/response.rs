use serde::Deserialize;

/// Result of the `createEtchPacket` mutation.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct EtchPacket {
    pub eid: String,
    pub name: Option<String>,
    #[serde(rename = "detailsURL")]
    pub details_url: Option<String>,
}
