use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::de::DeserializeOwned;

/// Input whose first non-whitespace character opens an array is a batch.
pub fn is_json_array(input: &[u8]) -> bool {
    input
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'[')
}

/// Decodes a single payload or a batch of payloads. An empty batch yields nothing.
pub fn parse_batch<T: DeserializeOwned>(input: &[u8]) -> anyhow::Result<Vec<T>> {
    if is_json_array(input) {
        return serde_json::from_slice::<Vec<T>>(input).context("issue parsing JSON input");
    }
    Ok(vec![
        serde_json::from_slice::<T>(input).context("issue parsing JSON input")?,
    ])
}

/// Output path of batch item `index`: `out.pdf`, `out-1.pdf`, `out-2.pdf`, ...
pub fn indexed_path(path: &Path, index: usize) -> PathBuf {
    if index == 0 {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}-{index}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{index}"),
    };
    path.with_file_name(name)
}

pub async fn write_indexed(path: &Path, index: usize, bytes: &[u8]) -> anyhow::Result<PathBuf> {
    let target = indexed_path(path, index);
    tokio::fs::write(&target, bytes)
        .await
        .with_context(|| format!("issue writing file to disk (index {index})"))?;

    tracing::debug!(path = %target.display(), bytes = bytes.len(), "wrote output");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use anvil_client_sdk::types::FillPdfPayload;
    use serde_json::json;

    use super::*;

    #[test]
    fn batch_outputs_are_index_suffixed() {
        let out = Path::new("out.pdf");
        assert_eq!(indexed_path(out, 0), PathBuf::from("out.pdf"));
        assert_eq!(indexed_path(out, 1), PathBuf::from("out-1.pdf"));
        assert_eq!(indexed_path(out, 2), PathBuf::from("out-2.pdf"));
    }

    #[test]
    fn indexed_path_keeps_directory_and_handles_missing_extension() {
        assert_eq!(
            indexed_path(Path::new("reports/q1.pdf"), 3),
            PathBuf::from("reports/q1-3.pdf")
        );
        assert_eq!(indexed_path(Path::new("out"), 1), PathBuf::from("out-1"));
    }

    #[test]
    fn detects_arrays_after_whitespace() {
        assert!(is_json_array(b"  \n[{}]"), "leading whitespace is skipped");
        assert!(!is_json_array(b"{\"data\":{}}"), "objects are single payloads");
        assert!(!is_json_array(b""), "empty input is not a batch");
    }

    #[test]
    fn parses_batch_of_fill_payloads() {
        let input = br#"[{"data":{"a":1}},{"data":{"a":2}}]"#;
        let payloads: Vec<FillPdfPayload> = parse_batch(input).expect("valid batch");

        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].data.get("a"), Some(&json!(1)));
        assert_eq!(payloads[1].data.get("a"), Some(&json!(2)));
    }

    #[test]
    fn parses_single_payload() {
        let payloads: Vec<FillPdfPayload> =
            parse_batch(br#"{"data":{"name":"Ada"},"title":"One"}"#).expect("valid payload");
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].title.as_deref(), Some("One"));
    }

    #[test]
    fn empty_batch_is_accepted() {
        let payloads: Vec<FillPdfPayload> = parse_batch(b" [ ] ").expect("empty batch");
        assert!(payloads.is_empty());
    }

    #[test]
    fn rejects_bad_json() {
        assert!(parse_batch::<FillPdfPayload>(b"{oops").is_err(), "malformed json");
        assert!(parse_batch::<FillPdfPayload>(b"[{oops}]").is_err(), "malformed batch");
    }

    #[tokio::test]
    async fn writes_batch_files_next_to_output() {
        let dir = tempfile::tempdir().expect("temp dir");
        let out = dir.path().join("out.pdf");

        let first = write_indexed(&out, 0, b"one").await.expect("first write");
        let second = write_indexed(&out, 1, b"two").await.expect("second write");

        assert_eq!(first, out);
        assert_eq!(second, dir.path().join("out-1.pdf"));
        assert_eq!(tokio::fs::read(&first).await.expect("readable"), b"one".to_vec());
        assert_eq!(tokio::fs::read(&second).await.expect("readable"), b"two".to_vec());
    }
}
