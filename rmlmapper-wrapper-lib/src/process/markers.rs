/// Why an engine run is considered a rules-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NoTriplesMaps,
    UncaughtException,
    EngineMissing,
    NonZeroExit,
    /// The process ended without an exit code (killed by a signal).
    Terminated,
}

/// Log signatures the engine prints on failure. It exits with the same
/// generic code for many causes, so the log text is checked first.
pub const MARKERS: &[(&str, FailureKind)] = &[
    ("No Triples Maps found.", FailureKind::NoTriplesMaps),
    ("Exception in thread", FailureKind::UncaughtException),
    ("Error: Unable to access jarfile", FailureKind::EngineMissing),
];

/// Classify a finished run. `None` means the run succeeded.
pub fn classify(exit_code: Option<i32>, log: &str) -> Option<FailureKind> {
    if let Some((_, kind)) = MARKERS.iter().find(|(marker, _)| log.contains(marker)) {
        return Some(*kind);
    }
    match exit_code {
        Some(0) => None,
        Some(_) => Some(FailureKind::NonZeroExit),
        None => Some(FailureKind::Terminated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_run() {
        assert_eq!(classify(Some(0), "INFO mapping done\n"), None);
        assert_eq!(classify(Some(0), ""), None);
    }

    #[test]
    fn test_marker_wins_over_exit_code() {
        let log = "12:00:01 ERROR be.ugent.rml.cli.Main - No Triples Maps found.\n";
        assert_eq!(classify(Some(1), log), Some(FailureKind::NoTriplesMaps));
        // reported even when the engine exits cleanly
        assert_eq!(classify(Some(0), log), Some(FailureKind::NoTriplesMaps));
    }

    #[test]
    fn test_other_markers() {
        assert_eq!(
            classify(Some(1), "Exception in thread \"main\" java.lang.NullPointerException"),
            Some(FailureKind::UncaughtException)
        );
        assert_eq!(
            classify(Some(1), "Error: Unable to access jarfile rmlmapper.jar"),
            Some(FailureKind::EngineMissing)
        );
    }

    #[test]
    fn test_exit_code_without_marker() {
        assert_eq!(classify(Some(2), "something"), Some(FailureKind::NonZeroExit));
        assert_eq!(classify(None, ""), Some(FailureKind::Terminated));
    }
}
