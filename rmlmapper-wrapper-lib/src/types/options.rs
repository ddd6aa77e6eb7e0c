use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::serialization::{MetadataDetailLevel, Serialization};
use crate::ExecutionError;

/// File stems the workspace reserves for its own files.
const RESERVED_STEMS: [&str; 3] = ["mapping", "output", "metadata"];

/// Per-call options for [`crate::RmlMapperWrapper::execute`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExecutionOptions {
    /// Logical source name (as referenced by the mapping) to raw content.
    pub sources: BTreeMap<String, String>,
    pub generate_metadata: bool,
    /// Parse the output into statements instead of returning raw text.
    pub as_quads: bool,
    pub serialization: Option<Serialization>,
    pub metadata_detail_level: MetadataDetailLevel,
    /// Merged over the wrapper's defaults; these win on collision.
    pub vm_options: BTreeMap<String, String>,
}

impl ExecutionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.sources.insert(name.into(), content.into());
        self
    }

    pub fn generate_metadata(mut self, generate_metadata: bool) -> Self {
        self.generate_metadata = generate_metadata;
        self
    }

    pub fn as_quads(mut self, as_quads: bool) -> Self {
        self.as_quads = as_quads;
        self
    }

    pub fn serialization(mut self, serialization: Serialization) -> Self {
        self.serialization = Some(serialization);
        self
    }

    pub fn metadata_detail_level(mut self, level: MetadataDetailLevel) -> Self {
        self.metadata_detail_level = level;
        self
    }

    pub fn vm_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vm_options.insert(key.into(), value.into());
        self
    }

    /// Effective output format, falling back to the engine default.
    pub fn effective_serialization(&self) -> Serialization {
        Serialization::resolve(self.serialization)
    }

    pub fn validate(&self) -> Result<(), ExecutionError> {
        for name in self.sources.keys() {
            validate_source_name(name)?;
        }

        if self.vm_options.keys().any(|key| key.trim().is_empty()) {
            return Err(ExecutionError::InvalidOptions(
                "VM option keys must not be empty".into(),
            ));
        }

        Ok(())
    }
}

fn validate_source_name(name: &str) -> Result<(), ExecutionError> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(ExecutionError::InvalidOptions(format!(
            "Invalid source name: '{}'",
            name
        )));
    }

    if name.contains(['/', '\\']) {
        return Err(ExecutionError::InvalidOptions(format!(
            "Source name '{}' must be a plain file name, not a path",
            name
        )));
    }

    let stem = name.split('.').next().unwrap_or(name);
    if RESERVED_STEMS.contains(&stem) {
        return Err(ExecutionError::InvalidOptions(format!(
            "Source name '{}' collides with a reserved workspace file ({})",
            name,
            RESERVED_STEMS.join(", ")
        )));
    }

    Ok(())
}
