//! Boundary to the graph-data parser.
//!
//! Statements are `oxrdf` quads; text is parsed with the `oxttl` parsers and
//! written back as N-Quads so that statement mappings can be handed to the
//! engine as a file.

use oxrdf::{GraphName, Quad};
use oxttl::{NQuadsParser, NTriplesParser, TriGParser, TurtleParser};

use crate::types::Serialization;
use crate::ExecutionError;

/// Parse `text` in the given format into statements.
///
/// `what` names the artifact (`"output"`, `"metadata"`) in error messages.
pub fn parse(
    text: &str,
    serialization: Serialization,
    what: &str,
) -> Result<Vec<Quad>, ExecutionError> {
    match serialization {
        Serialization::NQuads => NQuadsParser::new()
            .for_reader(text.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ExecutionError::parse(what, e)),
        Serialization::TriG => TriGParser::new()
            .for_reader(text.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ExecutionError::parse(what, e)),
        Serialization::NTriples => NTriplesParser::new()
            .for_reader(text.as_bytes())
            .map(|triple| triple.map(|t| t.in_graph(GraphName::DefaultGraph)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ExecutionError::parse(what, e)),
        Serialization::Turtle => TurtleParser::new()
            .for_reader(text.as_bytes())
            .map(|triple| triple.map(|t| t.in_graph(GraphName::DefaultGraph)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ExecutionError::parse(what, e)),
        other => Err(ExecutionError::parse(
            what,
            format!("{} cannot be parsed into statements", other),
        )),
    }
}

/// Serialize statements as N-Quads, one line per quad, in input order.
pub fn to_nquads(quads: &[Quad]) -> String {
    let mut out = String::new();
    for quad in quads {
        match &quad.graph_name {
            GraphName::DefaultGraph => out.push_str(&format!(
                "{} {} {} .\n",
                quad.subject, quad.predicate, quad.object
            )),
            graph_name => out.push_str(&format!(
                "{} {} {} {} .\n",
                quad.subject, quad.predicate, quad.object, graph_name
            )),
        }
    }
    out
}

/// True when every statement lives in the default graph, i.e. the N-Quads
/// serialization is plain N-Triples and therefore also valid Turtle.
pub fn is_default_graph_only(quads: &[Quad]) -> bool {
    quads.iter().all(|quad| quad.graph_name.is_default_graph())
}
