mod options;
mod result;
mod serialization;

pub use options::ExecutionOptions;
pub use result::{ExecutionResult, MappingDocument, Output};
pub use serialization::{MetadataDetailLevel, Serialization, DEFAULT_SERIALIZATION};
