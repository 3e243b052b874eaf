//! Client SDK for the [Anvil](https://www.useanvil.com) document API.
//!
//! The [`Client`] exposes five operations:
//!
//! - [`Client::fill_pdf`] fills a PDF template with data
//! - [`Client::generate_pdf`] renders a new PDF from markdown or HTML
//! - [`Client::download_documents`] fetches a completed document group as a zip
//! - [`Client::create_etch_packet`] starts an Etch e-signature packet
//! - [`Client::generate_etch_sign_url`] issues a signing link for one signer
//!
//! REST calls that hit the service's rate limit are retried after the advertised
//! `Retry-After` delay; GraphQL mutations are sent once.
//!
//! ```no_run
//! use anvil_client_sdk::{Client, Config};
//! use anvil_client_sdk::types::FillPdfPayload;
//! use serde_json::{Map, json};
//!
//! # async fn run() -> anvil_client_sdk::Result<()> {
//! let client = Client::new(Config::from_env()?)?;
//!
//! let mut data = Map::new();
//! data.insert("name".to_owned(), json!("Ada Lovelace"));
//! let pdf = client
//!     .fill_pdf("tmplAbc123", None, FillPdfPayload::builder().data(data).build())
//!     .await?;
//! # let _: Vec<u8> = pdf;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod graphql;
pub mod payload;
pub mod rest;
pub mod transport;
pub mod types;

pub use client::Client;
pub use config::Config;
pub use error::Error;
pub use payload::Payload;

pub type Result<T> = std::result::Result<T, Error>;
