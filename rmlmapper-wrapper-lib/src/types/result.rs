use oxrdf::Quad;

/// Mapping rules handed to the engine, either as serialized text or as
/// statements that are serialized before the workspace is created.
#[derive(Debug, Clone)]
pub enum MappingDocument {
    Text(String),
    Statements(Vec<Quad>),
}

impl From<&str> for MappingDocument {
    fn from(text: &str) -> Self {
        MappingDocument::Text(text.to_string())
    }
}

impl From<String> for MappingDocument {
    fn from(text: String) -> Self {
        MappingDocument::Text(text)
    }
}

impl From<Vec<Quad>> for MappingDocument {
    fn from(statements: Vec<Quad>) -> Self {
        MappingDocument::Statements(statements)
    }
}

/// Generated graph data, raw or parsed depending on `as_quads`.
///
/// Text formats are returned as `Text`, binary formats such as HDT as
/// `Bytes`.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Text(String),
    Bytes(Vec<u8>),
    Quads(Vec<Quad>),
}

impl Output {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Output::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Output::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_quads(&self) -> Option<&[Quad]> {
        match self {
            Output::Quads(quads) => Some(quads),
            _ => None,
        }
    }

    pub fn into_quads(self) -> Option<Vec<Quad>> {
        match self {
            Output::Quads(quads) => Some(quads),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Output::Text(text) => text.trim().is_empty(),
            Output::Bytes(bytes) => bytes.is_empty(),
            Output::Quads(quads) => quads.is_empty(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub output: Output,
    /// Present only when metadata generation was requested.
    pub metadata: Option<Output>,
    /// Combined engine stdout/stderr in arrival order.
    pub log: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_accessors() {
        let text = Output::Text("  \n".to_string());
        assert!(text.is_empty());
        assert_eq!(text.as_text(), Some("  \n"));
        assert!(text.clone().into_quads().is_none());

        let bytes = Output::Bytes(b"$\xff".to_vec());
        assert!(!bytes.is_empty());
        assert_eq!(bytes.as_bytes(), Some(&b"$\xff"[..]));
        assert!(bytes.as_text().is_none());

        let quads = Output::Quads(Vec::new());
        assert!(quads.is_empty());
        assert_eq!(quads.into_quads(), Some(Vec::new()));
    }
}
