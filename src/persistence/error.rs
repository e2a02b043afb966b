//! Error types for persistence operations.

use std::io;
use thiserror::Error;

/// Errors that can occur while saving or loading an index.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// I/O error (file operations, disk I/O)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Format error (invalid magic bytes, inconsistent header, unsorted table)
    #[error("format error: {0}")]
    Format(String),

    /// Container written by an incompatible format version
    #[error("unsupported format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Serialization error (key encoding)
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error (truncated or undecodable stream)
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Checksum mismatch (data corruption detected)
    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
}

impl PersistenceError {
    /// Classify an error raised while decoding: a short or corrupt stream is
    /// a decode failure, anything else stays an I/O failure.
    pub(crate) fn from_decode(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => {
                Self::Deserialization("unexpected end of stream".to_string())
            }
            io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => {
                Self::Deserialization(e.to_string())
            }
            _ => Self::Io(e),
        }
    }

    /// True for every failure caused by the stream contents rather than storage.
    pub fn is_decode_error(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::Serialization(_))
    }
}

#[cfg(feature = "persistence")]
impl From<postcard::Error> for PersistenceError {
    fn from(e: postcard::Error) -> Self {
        Self::Serialization(format!("postcard error: {}", e))
    }
}

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;
