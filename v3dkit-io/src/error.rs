//! Error types for scene decoding

use thiserror::Error;
use v3dkit_core::RecordTag;

/// Errors that can occur while decoding a scene file
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Unexpected end of data at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Unknown record tag {tag} at offset {offset}")]
    UnknownTag { tag: u32, offset: usize },

    #[error("Record {tag} at offset {offset} has no storable layout")]
    UnstorableRecord { tag: RecordTag, offset: usize },

    #[error("{what} index {index} out of range for {len} entries at offset {offset}")]
    IndexOutOfRange {
        what: &'static str,
        index: u32,
        len: usize,
        offset: usize,
    },

    #[error("Header key {key} declared {declared} words but its value used {consumed}")]
    HeaderLength { key: u32, declared: u32, consumed: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    /// Byte offset the error was detected at, when known
    pub fn offset(&self) -> Option<usize> {
        match self {
            DecodeError::Truncated { offset, .. }
            | DecodeError::UnknownTag { offset, .. }
            | DecodeError::UnstorableRecord { offset, .. }
            | DecodeError::IndexOutOfRange { offset, .. } => Some(*offset),
            DecodeError::HeaderLength { .. } | DecodeError::Io(_) => None,
        }
    }
}

impl From<DecodeError> for v3dkit_core::Error {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::Io(io) => v3dkit_core::Error::Io(io),
            other => v3dkit_core::Error::Decode(other.to_string()),
        }
    }
}
