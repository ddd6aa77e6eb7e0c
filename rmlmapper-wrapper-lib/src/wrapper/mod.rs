use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::Instrument;

use crate::command::CommandBuilder;
use crate::config::{WrapperBuilder, WrapperConfig};
use crate::output;
use crate::process::{classify, ProcessRunner};
use crate::rdf;
use crate::types::{ExecutionOptions, ExecutionResult, MappingDocument};
use crate::workspace::Workspace;
use crate::ExecutionError;

/// Runs mapping documents through the RMLMapper engine.
///
/// The wrapper holds only immutable configuration; clones share it and may
/// execute concurrently, each call getting its own workspace.
#[derive(Debug, Clone)]
pub struct RmlMapperWrapper {
    config: Arc<WrapperConfig>,
    runner: ProcessRunner,
}

impl RmlMapperWrapper {
    pub fn new(
        engine_path: impl Into<PathBuf>,
        temp_root: impl Into<PathBuf>,
        delete_temp_after_run: bool,
        vm_options: Option<BTreeMap<String, String>>,
    ) -> Result<Self, ExecutionError> {
        let mut config = WrapperConfig::new(engine_path, temp_root);
        config.delete_temp_after_run = delete_temp_after_run;
        config.vm_options = vm_options.unwrap_or_default();
        Self::from_config(config)
    }

    pub fn from_config(mut config: WrapperConfig) -> Result<Self, ExecutionError> {
        config.validate()?;
        // The engine's working directory is the workspace, not ours.
        config.engine_path = absolute(&config.engine_path)?;
        if config.java_path.components().count() > 1 {
            config.java_path = absolute(&config.java_path)?;
        }
        tracing::info!(
            "Creating wrapper for engine {:?} with temp root {:?}",
            config.engine_path,
            config.temp_root
        );
        Ok(Self {
            runner: ProcessRunner::new(config.timeout),
            config: Arc::new(config),
        })
    }

    pub fn builder(
        engine_path: impl Into<PathBuf>,
        temp_root: impl Into<PathBuf>,
    ) -> WrapperBuilder {
        WrapperBuilder::new(engine_path, temp_root)
    }

    pub fn config(&self) -> &WrapperConfig {
        &self.config
    }

    /// Execute `mapping` against the sources in `options`.
    ///
    /// The workspace is removed once this returns (or the future is
    /// dropped), unless the wrapper was configured to keep temp folders.
    pub async fn execute(
        &self,
        mapping: impl Into<MappingDocument>,
        options: ExecutionOptions,
    ) -> Result<ExecutionResult, ExecutionError> {
        options.validate()?;
        let (mapping, extension) = serialize_mapping(mapping.into());

        let mut workspace = Workspace::create(
            &self.config.temp_root,
            &mapping,
            extension,
            &options.sources,
        )
        .await?;
        if !self.config.delete_temp_after_run {
            workspace.retain();
        }

        let span = tracing::info_span!(
            "execute",
            workspace = %workspace.id(),
            retained = workspace.is_retained()
        );
        let result = self.run_in(&workspace, &options).instrument(span).await;
        result
    }

    async fn run_in(
        &self,
        workspace: &Workspace,
        options: &ExecutionOptions,
    ) -> Result<ExecutionResult, ExecutionError> {
        tracing::info!(
            "Executing mapping with {} source(s) in {}",
            options.sources.len(),
            workspace.dir().display()
        );

        let spec = CommandBuilder::new(
            &self.config.java_path,
            &self.config.engine_path,
            &self.config.vm_options,
        )
        .build(workspace, options);
        let outcome = self.runner.run(&spec).await?;

        if let Some(failure) = classify(outcome.exit_code, &outcome.log) {
            tracing::error!(
                "Engine failed ({:?}, exit code {:?})",
                failure,
                outcome.exit_code
            );
            return Err(ExecutionError::MappingExecution {
                failure,
                log: outcome.log,
            });
        }

        let collected = output::collect(workspace, options, &outcome.log).await?;
        tracing::info!("Mapping executed successfully");
        Ok(ExecutionResult {
            output: collected.output,
            metadata: collected.metadata,
            log: outcome.log,
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ExecutionError> {
    std::path::absolute(path).map_err(|e| {
        ExecutionError::Config(format!("Cannot resolve {}: {}", path.display(), e))
    })
}

/// Text mappings go to the engine as Turtle. Statement mappings are written
/// as N-Quads, which is also valid Turtle when no named graph is used.
fn serialize_mapping(mapping: MappingDocument) -> (String, &'static str) {
    match mapping {
        MappingDocument::Text(text) => (text, "ttl"),
        MappingDocument::Statements(quads) => {
            let extension = if rdf::is_default_graph_only(&quads) {
                "ttl"
            } else {
                "nq"
            };
            (rdf::to_nquads(&quads), extension)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use oxrdf::{GraphName, NamedNode, Quad};

    fn quad(graph: GraphName) -> Quad {
        Quad::new(
            NamedNode::new_unchecked("http://example.com/s"),
            NamedNode::new_unchecked("http://example.com/p"),
            NamedNode::new_unchecked("http://example.com/o"),
            graph,
        )
    }

    #[test]
    fn test_serialize_mapping_extensions() {
        let (text, ext) = serialize_mapping("<a> <b> <c> .".into());
        assert_eq!((text.as_str(), ext), ("<a> <b> <c> .", "ttl"));

        let (_, ext) = serialize_mapping(vec![quad(GraphName::DefaultGraph)].into());
        assert_eq!(ext, "ttl");

        let named = GraphName::NamedNode(NamedNode::new_unchecked("http://example.com/g"));
        let (text, ext) = serialize_mapping(vec![quad(named)].into());
        assert_eq!(ext, "nq");
        assert!(text.ends_with("<http://example.com/g> .\n"));
    }

    #[test]
    fn test_relative_paths_are_made_absolute() {
        let wrapper = RmlMapperWrapper::new("rmlmapper.jar", "tmp", true, None).unwrap();
        let config = wrapper.config();
        assert!(config.engine_path.is_absolute());
        assert!(config.engine_path.ends_with("rmlmapper.jar"));
        // bare launcher names are left to PATH lookup
        assert_eq!(config.java_path, PathBuf::from("java"));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = RmlMapperWrapper::new("", "tmp", true, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[tokio::test]
    async fn test_invalid_options_create_no_workspace() {
        let root = tempfile::tempdir().unwrap();
        let temp_root = root.path().join("work");
        let wrapper = RmlMapperWrapper::new("engine.jar", &temp_root, true, None).unwrap();
        let err = wrapper
            .execute("", ExecutionOptions::new().source("../escape.csv", ""))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOptions);
        assert!(!temp_root.exists());
    }
}
