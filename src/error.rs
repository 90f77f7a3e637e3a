//! Error types for sorter configuration.

use thiserror::Error;

/// Result type alias for `pradix` operations.
pub type Result<T> = std::result::Result<T, SortError>;

/// Error type for `pradix` operations.
///
/// Sorting itself cannot fail once a [`RadixSorter`](crate::RadixSorter) has been
/// built; every variant here describes a rejected configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SortError {
    /// Digit width other than 4, 8 or 16 bits.
    #[error("Unsupported digit width: {bits} bits (expected 4, 8 or 16)")]
    UnsupportedDigitWidth {
        /// The rejected width in bits
        bits: u32,
    },

    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: &'static str,
        /// Explanation of why it's invalid
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_digit_width() {
        let msg = format!("{}", SortError::UnsupportedDigitWidth { bits: 12 });
        assert!(msg.contains("12 bits"));
        assert!(msg.contains("4, 8 or 16"));
    }

    #[test]
    fn test_invalid_parameter() {
        let error = SortError::InvalidParameter {
            parameter: "worker_count",
            reason: "must be >= 1".to_string(),
        };
        let msg = format!("{error}");
        assert!(msg.contains("Invalid parameter 'worker_count'"));
        assert!(msg.contains("must be >= 1"));
    }
}
