//! Translator error types

use thiserror::Error;

/// Failure of a single span translation.
///
/// The core [`translate`](crate::translate) function never fails; these
/// variants exist for pluggable translators and for panics captured at the
/// span processor boundary.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("Translation rejected: {0}")]
    Rejected(String),

    #[error("Translation panicked: {0}")]
    Panicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display() {
        let err = TranslateError::Rejected("unsupported span".to_string());
        assert_eq!(err.to_string(), "Translation rejected: unsupported span");
    }

    #[test]
    fn test_panicked_display() {
        let err = TranslateError::Panicked("index out of bounds".to_string());
        assert_eq!(err.to_string(), "Translation panicked: index out of bounds");
    }
}
