//! Engine process execution and outcome classification.

mod markers;
mod runner;

pub use markers::{classify, FailureKind, MARKERS};
pub use runner::{ProcessOutcome, ProcessRunner};
