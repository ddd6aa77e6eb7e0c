use std::path::PathBuf;

use thiserror::Error;

use crate::process::FailureKind;

/// Message carried by every rules-level failure reported by the engine.
pub const RULES_ERROR_MESSAGE: &str = "Error while executing the rules.";

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to spawn engine '{program}': {source}")]
    ProcessSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Engine process failed: {reason}")]
    Process { reason: String, log: String },
    #[error("Error while executing the rules.")]
    MappingExecution { failure: FailureKind, log: String },
    #[error("Engine reported success but {reason}")]
    Consistency { reason: String, log: String },
    #[error("Failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Coarse classification of an [`ExecutionError`], convenient for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Filesystem,
    ProcessSpawn,
    Process,
    MappingExecution,
    Consistency,
    Parse,
    InvalidOptions,
    Config,
}

impl ExecutionError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExecutionError::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(what: impl Into<String>, reason: impl ToString) -> Self {
        ExecutionError::Parse {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutionError::Filesystem { .. } => ErrorKind::Filesystem,
            ExecutionError::ProcessSpawn { .. } => ErrorKind::ProcessSpawn,
            ExecutionError::Process { .. } => ErrorKind::Process,
            ExecutionError::MappingExecution { .. } => ErrorKind::MappingExecution,
            ExecutionError::Consistency { .. } => ErrorKind::Consistency,
            ExecutionError::Parse { .. } => ErrorKind::Parse,
            ExecutionError::InvalidOptions(_) => ErrorKind::InvalidOptions,
            ExecutionError::Config(_) => ErrorKind::Config,
        }
    }

    /// Short, stable classification string. Use `Display` for the detailed form.
    pub fn message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Filesystem => "Workspace could not be prepared.",
            ErrorKind::ProcessSpawn => "Engine could not be started.",
            ErrorKind::Process => "Engine process did not complete.",
            ErrorKind::MappingExecution => RULES_ERROR_MESSAGE,
            ErrorKind::Consistency => "Engine output is missing.",
            ErrorKind::Parse => "Output could not be parsed.",
            ErrorKind::InvalidOptions => "Invalid execution options.",
            ErrorKind::Config => "Invalid wrapper configuration.",
        }
    }

    /// Captured engine log, when the error happened after the engine ran.
    pub fn log(&self) -> Option<&str> {
        match self {
            ExecutionError::Process { log, .. }
            | ExecutionError::MappingExecution { log, .. }
            | ExecutionError::Consistency { log, .. } => Some(log),
            _ => None,
        }
    }
}
