//! Error types for minhash-forest.

use std::fmt;

/// Errors that can occur while configuring, filling or querying an index.
#[derive(Debug, Clone, PartialEq)]
pub enum LshError {
    /// No valid banding exists for the requested configuration
    /// (zero hash values, threshold outside `[0, 1]`, bad integration step).
    InvalidParameter(String),
    /// Signature length does not match `K * L` of the index.
    SignatureLength { expected: usize, actual: usize },
    /// The index cannot address more entries.
    CapacityExceeded(usize),
}

impl fmt::Display for LshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LshError::InvalidParameter(msg) => write!(f, "Invalid parameter: {msg}"),
            LshError::SignatureLength { expected, actual } => write!(
                f,
                "Signature length mismatch: index expects {expected} hash values, got {actual}",
            ),
            LshError::CapacityExceeded(len) => {
                write!(f, "Index capacity exceeded: cannot add entry #{len}")
            }
        }
    }
}

impl std::error::Error for LshError {}

pub type Result<T> = std::result::Result<T, LshError>;
