//! Error types for v3dkit

use crate::tags::RecordTag;
use thiserror::Error;

/// Main error type for v3dkit operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Rendering is not supported for {0} records")]
    UnsupportedGeometry(RecordTag),

    #[error("GPU error: {0}")]
    Gpu(String),

    /// The device session can no longer be used; build a fresh renderer.
    #[error("GPU session lost: {0}")]
    SessionLost(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl Error {
    /// True when the error means the render session must be rebuilt
    pub fn is_session_lost(&self) -> bool {
        matches!(self, Error::SessionLost(_))
    }
}

/// Result type alias for v3dkit operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_session_lost_requires_rebuild() {
        assert!(Error::SessionLost("device removed".to_string()).is_session_lost());
        assert!(!Error::Gpu("no adapter".to_string()).is_session_lost());
        assert!(!Error::InvalidData("bad size".to_string()).is_session_lost());
    }
}
