//! RMLMapper execution wrapper
//!
//! This library runs RML mapping documents through the RMLMapper engine as a
//! child process. Each call gets an isolated workspace holding the mapping and
//! its sources, and returns the generated RDF (raw or parsed into quads), the
//! optional provenance metadata and the engine log.

mod command;
mod config;
mod error;
mod output;
mod process;
pub mod rdf;
mod types;
mod workspace;
mod wrapper;

pub use command::{CommandBuilder, CommandSpec};
pub use config::{WrapperBuilder, WrapperConfig};
pub use error::{ErrorKind, ExecutionError, RULES_ERROR_MESSAGE};
pub use process::{classify, FailureKind, ProcessOutcome, ProcessRunner, MARKERS};
pub use types::{
    ExecutionOptions, ExecutionResult, MappingDocument, MetadataDetailLevel, Output,
    Serialization, DEFAULT_SERIALIZATION,
};
pub use workspace::Workspace;
pub use wrapper::RmlMapperWrapper;

pub use oxrdf;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Once;
    use tracing::info;

    static INIT: Once = Once::new();

    /// Initialize logging exactly once for all tests
    fn init_logging() {
        INIT.call_once(|| {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(tracing::Level::DEBUG)
                .init();
        });
    }

    #[test]
    fn test_default_serialization_drives_both_sides() {
        init_logging();

        info!("Checking default serialization wiring");
        let options = ExecutionOptions::default();
        assert_eq!(options.effective_serialization(), DEFAULT_SERIALIZATION);
        assert_eq!(
            "nquads".parse::<Serialization>().unwrap(),
            DEFAULT_SERIALIZATION
        );
    }
}
