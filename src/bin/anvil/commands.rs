use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use anvil_client_sdk::Client;
use anvil_client_sdk::types::{FillPdfPayload, GeneratePdfPayload, TemplateVersion};
use anyhow::Context as _;

use crate::output;

async fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("issue reading input file {}", path.display()))
}

/// Fills one PDF per payload, writing each as soon as it arrives.
pub async fn fill_pdf(
    client: &Client,
    template_id: &str,
    version: Option<TemplateVersion>,
    input: &Path,
    out: &Path,
) -> anyhow::Result<()> {
    let payloads: Vec<FillPdfPayload> = output::parse_batch(&read_input(input).await?)?;

    for (i, payload) in payloads.into_iter().enumerate() {
        let pdf = client
            .fill_pdf(template_id, version, payload)
            .await
            .with_context(|| format!("issue filling PDF (index {i})"))?;
        output::write_indexed(out, i, &pdf).await?;
    }
    Ok(())
}

pub async fn generate_pdf(client: &Client, input: &Path, out: &Path) -> anyhow::Result<()> {
    let payloads: Vec<GeneratePdfPayload> = output::parse_batch(&read_input(input).await?)?;

    for (i, payload) in payloads.into_iter().enumerate() {
        let pdf = client
            .generate_pdf(payload)
            .await
            .with_context(|| format!("issue generating PDF (index {i})"))?;
        output::write_indexed(out, i, &pdf).await?;
    }
    Ok(())
}

pub async fn create_etch(client: &Client, payload: &Path) -> anyhow::Result<()> {
    let variables = read_input(payload).await?;
    let eid = client
        .create_etch_packet(variables)
        .await
        .context("issue creating etch packet")?;

    writeln!(io::stdout().lock(), "Etch packet created with id: {eid}")?;
    Ok(())
}

pub async fn generate_etch_url(
    client: &Client,
    signer_eid: &str,
    client_user_id: &str,
) -> anyhow::Result<()> {
    let url = client
        .generate_etch_sign_url(signer_eid, client_user_id)
        .await
        .context("issue generating etch signing URL")?;

    writeln!(io::stdout().lock(), "Signing URL is: {url}")?;
    Ok(())
}

pub async fn download_documents(
    client: &Client,
    document_group: &str,
    filename: Option<&Path>,
    to_stdout: bool,
) -> anyhow::Result<()> {
    let zip = client
        .download_documents(document_group)
        .await
        .context("issue downloading documents")?;

    if to_stdout {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&zip).context("issue writing to stdout")?;
        stdout.flush().context("issue writing to stdout")?;
        return Ok(());
    }

    let target = filename.map_or_else(
        || PathBuf::from(format!("{document_group}.zip")),
        Path::to_path_buf,
    );
    tokio::fs::write(&target, &zip)
        .await
        .with_context(|| format!("issue writing file {}", target.display()))?;
    Ok(())
}
