use std::fmt;
use std::str::FromStr;

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;
use strum_macros::Display;

use crate::error::Error;

/// Query value selecting the newest template version, published or not.
pub const TEMPLATE_VERSION_LATEST: i64 = -1;
/// Query value selecting the newest published template version.
pub const TEMPLATE_VERSION_LATEST_PUBLISHED: i64 = -2;

/// Body of `POST /fill/{template}.pdf`.
///
/// Optional presentation overrides are omitted from the JSON when unset.
#[skip_serializing_none]
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct FillPdfPayload {
    /// Field identifier to value.
    pub data: Map<String, Value>,
    #[builder(into)]
    pub title: Option<String>,
    #[builder(into)]
    pub font_family: Option<String>,
    pub font_size: Option<u32>,
    #[builder(into)]
    pub text_color: Option<String>,
    pub use_interactive_fields: Option<bool>,
}

/// Source format of a [`GeneratePdfPayload`].
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContentType {
    #[default]
    Markdown,
    Html,
}

/// Content of a generated PDF: markdown text, or an HTML document with optional CSS.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeneratePdfData {
    Text(String),
    Html {
        html: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        css: Option<String>,
    },
}

impl From<String> for GeneratePdfData {
    fn from(value: String) -> Self {
        GeneratePdfData::Text(value)
    }
}

impl From<&str> for GeneratePdfData {
    fn from(value: &str) -> Self {
        GeneratePdfData::Text(value.to_owned())
    }
}

/// Body of `POST /generate-pdf`.
#[skip_serializing_none]
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePdfPayload {
    #[builder(into)]
    pub data: GeneratePdfData,
    #[builder(into)]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<ContentType>,
    #[builder(into)]
    pub font_family: Option<String>,
    pub font_size: Option<u32>,
    #[builder(into)]
    pub text_color: Option<String>,
    pub include_timestamp: Option<bool>,
    pub logo: Option<Logo>,
    pub page: Option<Page>,
}

#[skip_serializing_none]
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct Logo {
    #[builder(into)]
    pub src: Option<String>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

/// Page geometry. Margins are CSS lengths such as `"50px"`.
#[skip_serializing_none]
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    #[builder(into)]
    pub margin: Option<String>,
    #[builder(into)]
    pub margin_top: Option<String>,
    #[builder(into)]
    pub margin_bottom: Option<String>,
    #[builder(into)]
    pub margin_left: Option<String>,
    #[builder(into)]
    pub margin_right: Option<String>,
    #[builder(into)]
    pub page_count: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Template version to fill. Leaving the selector unset lets the service pick
/// the latest published version.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateVersion {
    Latest,
    LatestPublished,
    Number(u32),
}

impl TemplateVersion {
    /// Value sent as the `versionNumber` query parameter.
    #[must_use]
    pub fn query_value(self) -> String {
        match self {
            TemplateVersion::Latest => TEMPLATE_VERSION_LATEST.to_string(),
            TemplateVersion::LatestPublished => TEMPLATE_VERSION_LATEST_PUBLISHED.to_string(),
            TemplateVersion::Number(n) => n.to_string(),
        }
    }
}

impl fmt::Display for TemplateVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateVersion::Latest => f.write_str("latest"),
            TemplateVersion::LatestPublished => f.write_str("latest-published"),
            TemplateVersion::Number(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for TemplateVersion {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" | "-1" => Ok(TemplateVersion::Latest),
            "latest-published" | "latest_published" | "-2" => {
                Ok(TemplateVersion::LatestPublished)
            }
            other => other.parse::<u32>().map(TemplateVersion::Number).map_err(|e| {
                Error::validation(format!(
                    "invalid template version `{other}` ({e}); expected latest|latest-published|<number>"
                ))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn fill_payload_omits_unset_fields() {
        let mut data = Map::new();
        data.insert("name".to_owned(), json!("Ada"));
        let payload = FillPdfPayload::builder().data(data).build();

        let encoded = serde_json::to_value(&payload).expect("encodes");
        assert_eq!(encoded, json!({ "data": { "name": "Ada" } }));

        let decoded: FillPdfPayload = serde_json::from_value(encoded).expect("decodes");
        assert_eq!(decoded, payload);
    }

    #[test]
    fn fill_payload_uses_camel_case_keys() {
        let payload = FillPdfPayload::builder()
            .data(Map::new())
            .font_size(12)
            .text_color("#333333")
            .use_interactive_fields(true)
            .build();

        let encoded = serde_json::to_value(&payload).expect("encodes");
        assert_eq!(
            encoded,
            json!({
                "data": {},
                "fontSize": 12,
                "textColor": "#333333",
                "useInteractiveFields": true,
            })
        );
    }

    #[test]
    fn generate_payload_serializes_nested_options() {
        let payload = GeneratePdfPayload::builder()
            .data(GeneratePdfData::Html {
                html: "<h1>Hi</h1>".to_owned(),
                css: None,
            })
            .content_type(ContentType::Html)
            .logo(Logo::builder().src("https://example.com/logo.png").max_width(200).build())
            .page(Page::builder().margin("20px").build())
            .build();

        let encoded = serde_json::to_value(&payload).expect("encodes");
        assert_eq!(
            encoded,
            json!({
                "data": { "html": "<h1>Hi</h1>" },
                "type": "html",
                "logo": { "src": "https://example.com/logo.png", "maxWidth": 200 },
                "page": { "margin": "20px" },
            })
        );
    }

    #[test]
    fn generate_payload_decodes_markdown_text() {
        let payload: GeneratePdfPayload =
            serde_json::from_value(json!({ "data": "# Title", "title": "Doc" })).expect("decodes");
        assert_eq!(payload.data, GeneratePdfData::Text("# Title".to_owned()));
        assert_eq!(payload.title.as_deref(), Some("Doc"));
        assert_eq!(payload.content_type, None);
    }

    #[test]
    fn content_type_display_is_lowercase() {
        assert_eq!(ContentType::Markdown.to_string(), "markdown");
        assert_eq!(ContentType::Html.to_string(), "html");
    }

    #[test]
    fn template_version_parses_sentinels_and_numbers() {
        assert_eq!("latest".parse::<TemplateVersion>().ok(), Some(TemplateVersion::Latest));
        assert_eq!("-2".parse::<TemplateVersion>().ok(), Some(TemplateVersion::LatestPublished));
        assert_eq!("7".parse::<TemplateVersion>().ok(), Some(TemplateVersion::Number(7)));
        assert!("seven".parse::<TemplateVersion>().is_err(), "non-numeric must fail");

        assert_eq!(TemplateVersion::Latest.query_value(), "-1");
        assert_eq!(TemplateVersion::LatestPublished.query_value(), "-2");
        assert_eq!(TemplateVersion::Number(3).query_value(), "3");
    }
}
