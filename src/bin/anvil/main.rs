//! `anvil`: command-line front end for the Anvil document API.
//!
//! Requires `ANVIL_API_KEY` in the environment.

mod commands;
mod output;

use std::io::{self, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

use anvil_client_sdk::types::TemplateVersion;
use anvil_client_sdk::{Client, Config};
use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "anvil", author, version, about = "A CLI for the Anvil API", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Show debug logs
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fill PDF template with data
    FillPdf {
        /// Filename of output PDF
        #[arg(short, long)]
        out: PathBuf,
        /// Filename of JSON payload input
        #[arg(short, long)]
        input: PathBuf,
        /// Template version: latest, latest-published or a version number
        #[arg(long)]
        template_version: Option<TemplateVersion>,
        /// Template to fill
        #[arg(value_name = "TEMPLATE_ID")]
        template_id: String,
    },
    /// Generate a PDF
    GeneratePdf {
        /// Filename of output PDF
        #[arg(short, long)]
        out: PathBuf,
        /// Filename of JSON payload input
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Create an Etch e-signature packet
    CreateEtch {
        /// Filename of JSON createEtchPacket variables
        #[arg(short, long)]
        payload: PathBuf,
    },
    /// Generate a signing URL for an Etch signer
    GenerateEtchUrl {
        /// Your identifier for the signing user
        #[arg(short, long)]
        client: String,
        /// Signer eid
        #[arg(short, long)]
        signer: String,
    },
    /// Download the completed documents of a document group as a zip
    DownloadDocuments {
        /// Document group eid
        #[arg(short = 'd', long)]
        document_group: String,
        /// Output filename, defaults to `<DOCUMENT_GROUP>.zip`
        #[arg(short, long, conflicts_with = "stdout")]
        filename: Option<PathBuf>,
        /// Write the zip to stdout instead of a file
        #[arg(long)]
        stdout: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ignored = writeln!(io::stderr().lock(), "Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::from_env().context("issue loading configuration")?;
    config.debug = cli.debug;
    let client = Client::new(config).context("issue creating client")?;

    match cli.command {
        Command::FillPdf {
            out,
            input,
            template_version,
            template_id,
        } => commands::fill_pdf(&client, &template_id, template_version, &input, &out).await,
        Command::GeneratePdf { out, input } => commands::generate_pdf(&client, &input, &out).await,
        Command::CreateEtch { payload } => commands::create_etch(&client, &payload).await,
        Command::GenerateEtchUrl { client: user, signer } => {
            commands::generate_etch_url(&client, &signer, &user).await
        }
        Command::DownloadDocuments {
            document_group,
            filename,
            stdout,
        } => {
            commands::download_documents(&client, &document_group, filename.as_deref(), stdout)
                .await
        }
    }
}
