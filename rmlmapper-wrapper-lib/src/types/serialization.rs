use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ExecutionError;

/// Output formats accepted by the engine's `-s` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Serialization {
    NQuads,
    Turtle,
    TriG,
    TriX,
    JsonLd,
    Hdt,
    NTriples,
}

/// Format the engine falls back to when no `-s` flag is given. The command
/// builder and the output collector both resolve an absent serialization
/// through this constant.
pub const DEFAULT_SERIALIZATION: Serialization = Serialization::NQuads;

impl Serialization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Serialization::NQuads => "nquads",
            Serialization::Turtle => "turtle",
            Serialization::TriG => "trig",
            Serialization::TriX => "trix",
            Serialization::JsonLd => "jsonld",
            Serialization::Hdt => "hdt",
            Serialization::NTriples => "ntriples",
        }
    }

    /// File extension used for workspace files written in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Serialization::NQuads => "nq",
            Serialization::Turtle => "ttl",
            Serialization::TriG => "trig",
            Serialization::TriX => "xml",
            Serialization::JsonLd => "jsonld",
            Serialization::Hdt => "hdt",
            Serialization::NTriples => "nt",
        }
    }

    /// HDT is a binary container; every other format is UTF-8 text.
    pub fn is_binary(&self) -> bool {
        matches!(self, Serialization::Hdt)
    }

    pub fn resolve(serialization: Option<Serialization>) -> Serialization {
        serialization.unwrap_or(DEFAULT_SERIALIZATION)
    }
}

impl fmt::Display for Serialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Serialization {
    type Err = ExecutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nquads" => Ok(Serialization::NQuads),
            "turtle" => Ok(Serialization::Turtle),
            "trig" => Ok(Serialization::TriG),
            "trix" => Ok(Serialization::TriX),
            "jsonld" => Ok(Serialization::JsonLd),
            "hdt" => Ok(Serialization::Hdt),
            "ntriples" => Ok(Serialization::NTriples),
            _ => Err(ExecutionError::InvalidOptions(format!(
                "Invalid serialization: {} [Expected: nquads, turtle, trig, trix, jsonld, hdt, ntriples]",
                s
            ))),
        }
    }
}

/// Granularity of the provenance metadata (`-l` flag).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataDetailLevel {
    Dataset,
    #[default]
    Triple,
    Term,
}

impl MetadataDetailLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataDetailLevel::Dataset => "dataset",
            MetadataDetailLevel::Triple => "triple",
            MetadataDetailLevel::Term => "term",
        }
    }
}

impl FromStr for MetadataDetailLevel {
    type Err = ExecutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dataset" => Ok(MetadataDetailLevel::Dataset),
            "triple" => Ok(MetadataDetailLevel::Triple),
            "term" => Ok(MetadataDetailLevel::Term),
            _ => Err(ExecutionError::InvalidOptions(format!(
                "Invalid metadata detail level: {} [Expected: dataset, triple, term]",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serialization() {
        assert_eq!(
            "JSONLD".parse::<Serialization>().unwrap(),
            Serialization::JsonLd
        );
        assert_eq!(
            "ntriples".parse::<Serialization>().unwrap(),
            Serialization::NTriples
        );
        assert!("rdfxml".parse::<Serialization>().is_err());
    }

    #[test]
    fn test_default_resolution() {
        assert_eq!(Serialization::resolve(None), DEFAULT_SERIALIZATION);
        assert_eq!(
            Serialization::resolve(Some(Serialization::Turtle)),
            Serialization::Turtle
        );
        assert_eq!(DEFAULT_SERIALIZATION.extension(), "nq");
        assert!(!DEFAULT_SERIALIZATION.is_binary());
        assert!(Serialization::Hdt.is_binary());
    }

    #[test]
    fn test_serde_names_match_engine_flags() {
        let value = serde_json::to_value(Serialization::TriG).unwrap();
        assert_eq!(value, serde_json::json!("trig"));
        let level: MetadataDetailLevel = serde_json::from_str("\"term\"").unwrap();
        assert_eq!(level, MetadataDetailLevel::Term);
    }
}
