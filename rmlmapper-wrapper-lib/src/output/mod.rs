use std::path::Path;

use crate::rdf;
use crate::types::{ExecutionOptions, Output, Serialization};
use crate::workspace::Workspace;
use crate::ExecutionError;

/// Output and optional metadata read back from a workspace.
#[derive(Debug, Clone)]
pub struct Collected {
    pub output: Output,
    pub metadata: Option<Output>,
}

/// Read the engine's artifacts after a successful run.
///
/// `log` is attached to consistency errors so a caller can see what the
/// engine printed while failing to produce its files.
pub async fn collect(
    workspace: &Workspace,
    options: &ExecutionOptions,
    log: &str,
) -> Result<Collected, ExecutionError> {
    let serialization = options.effective_serialization();

    let output_file = workspace.output_file(serialization);
    let output = read_artifact(&output_file, "output", serialization, options.as_quads, log).await?;

    let metadata = if options.generate_metadata {
        let metadata_file = workspace.metadata_file(serialization);
        Some(read_artifact(&metadata_file, "metadata", serialization, options.as_quads, log).await?)
    } else {
        None
    };

    Ok(Collected { output, metadata })
}

async fn read_artifact(
    path: &Path,
    what: &str,
    serialization: Serialization,
    as_quads: bool,
    log: &str,
) -> Result<Output, ExecutionError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::error!("Expected {} file is missing: {}", what, path.display());
            return Err(ExecutionError::Consistency {
                reason: format!("the {} file {} was not produced", what, path.display()),
                log: log.to_string(),
            });
        }
        Err(e) => return Err(ExecutionError::filesystem(path, e)),
    };

    if serialization.is_binary() {
        if as_quads {
            return Err(ExecutionError::parse(
                what,
                format!("{} cannot be parsed into statements", serialization),
            ));
        }
        return Ok(Output::Bytes(bytes));
    }

    let text = String::from_utf8(bytes).map_err(|e| {
        ExecutionError::parse(what, format!("{} output is not valid UTF-8: {}", serialization, e))
    })?;

    if as_quads {
        Ok(Output::Quads(rdf::parse(&text, serialization, what)?))
    } else {
        Ok(Output::Text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use std::collections::BTreeMap;

    const NQUADS: &str =
        "<http://example.com/0> <http://xmlns.com/foaf/0.1/name> \"Venus\" .\n";

    async fn workspace(root: &Path) -> Workspace {
        Workspace::create(root, "", "ttl", &BTreeMap::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_collect_raw_text() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path()).await;
        std::fs::write(ws.output_file(Serialization::NQuads), NQUADS).unwrap();

        let collected = collect(&ws, &ExecutionOptions::default(), "")
            .await
            .unwrap();
        assert_eq!(collected.output, Output::Text(NQUADS.to_string()));
        assert!(collected.metadata.is_none());
    }

    #[tokio::test]
    async fn test_collect_quads_with_metadata() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path()).await;
        std::fs::write(ws.output_file(Serialization::NQuads), NQUADS).unwrap();
        std::fs::write(ws.metadata_file(Serialization::NQuads), NQUADS).unwrap();

        let options = ExecutionOptions::new().as_quads(true).generate_metadata(true);
        let collected = collect(&ws, &options, "").await.unwrap();
        assert_eq!(collected.output.as_quads().unwrap().len(), 1);
        assert_eq!(collected.metadata.unwrap().as_quads().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_output_is_consistency_error() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path()).await;
        let err = collect(&ws, &ExecutionOptions::default(), "engine log")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consistency);
        assert_eq!(err.log(), Some("engine log"));
    }

    #[tokio::test]
    async fn test_missing_metadata_is_consistency_error() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path()).await;
        std::fs::write(ws.output_file(Serialization::NQuads), NQUADS).unwrap();
        let options = ExecutionOptions::new().generate_metadata(true);
        let err = collect(&ws, &options, "").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consistency);
        assert!(err.to_string().contains("metadata"));
    }

    #[tokio::test]
    async fn test_unparseable_output_is_not_degraded_to_text() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path()).await;
        std::fs::write(ws.output_file(Serialization::NQuads), "not rdf at all").unwrap();
        let options = ExecutionOptions::new().as_quads(true);
        let err = collect(&ws, &options, "").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[tokio::test]
    async fn test_binary_output_is_returned_as_bytes() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path()).await;
        let hdt: &[u8] = b"$HDT\x01\xff\xfe";
        std::fs::write(ws.output_file(Serialization::Hdt), hdt).unwrap();

        let options = ExecutionOptions::new().serialization(Serialization::Hdt);
        let collected = collect(&ws, &options, "").await.unwrap();
        assert_eq!(collected.output, Output::Bytes(hdt.to_vec()));

        let err = collect(&ws, &options.as_quads(true), "").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[tokio::test]
    async fn test_non_utf8_text_output_is_parse_error() {
        let root = tempfile::tempdir().unwrap();
        let ws = workspace(root.path()).await;
        std::fs::write(ws.output_file(Serialization::NQuads), b"<\xff\xfe>").unwrap();

        let err = collect(&ws, &ExecutionOptions::default(), "")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("UTF-8"));
    }
}
