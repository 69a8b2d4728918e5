//! Test assertions for pipeline results.

use crate::core::{Artifact, Cursor, TubesResult};

/// Asserts that the run recorded no errors.
pub fn assert_no_errors(result: &TubesResult) {
    assert!(
        result.is_clean(),
        "Expected no errors, got: {:?}",
        result.errors.iter().map(|e| (e.cursor().to_string(), e.message().to_string())).collect::<Vec<_>>()
    );
}

/// Asserts the final artifact.
pub fn assert_output(result: &TubesResult, expected: &Artifact) {
    assert_eq!(
        &result.output, expected,
        "Expected output {expected}, got {}",
        result.output
    );
}

/// Asserts the number of recorded errors.
pub fn assert_error_count(result: &TubesResult, expected: usize) {
    assert_eq!(
        result.errors.len(),
        expected,
        "Expected {expected} errors, got {}: {:?}",
        result.errors.len(),
        result.errors.iter().map(|e| e.message().to_string()).collect::<Vec<_>>()
    );
}

/// Asserts that some recorded error happened at `cursor`.
pub fn assert_error_at(result: &TubesResult, cursor: &Cursor) {
    assert!(
        result.errors.iter().any(|e| e.cursor() == cursor),
        "Expected an error at {cursor}, errors were at: {:?}",
        result.error_cursors().iter().map(ToString::to_string).collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorOrigin, TubesError};
    use serde_json::json;

    fn failed_at(cursor: Cursor) -> TubesResult {
        TubesResult::new(
            vec![TubesError::new(anyhow::anyhow!("x"), cursor, None, ErrorOrigin::Thrown)],
            json!(null),
        )
    }

    #[test]
    fn test_passing_assertions() {
        let clean = TubesResult::new(Vec::new(), json!("bar"));
        assert_no_errors(&clean);
        assert_output(&clean, &json!("bar"));
        assert_error_count(&clean, 0);

        let failed = failed_at(Cursor::new("do", "do", 0));
        assert_error_count(&failed, 1);
        assert_error_at(&failed, &Cursor::new("do", "do", 0));
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_panics() {
        assert_no_errors(&failed_at(Cursor::default()));
    }

    #[test]
    #[should_panic(expected = "Expected an error at do/doAfter#0")]
    fn test_assert_error_at_panics() {
        assert_error_at(&failed_at(Cursor::new("do", "do", 0)), &Cursor::new("do", "doAfter", 0));
    }
}
