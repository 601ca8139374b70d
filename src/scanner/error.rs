//! Scan Error Taxonomy
//!
//! Recoverable conditions are absorbed where they occur and surfaced as
//! data on the scan result; only validation and clone failures stop a
//! scan early, and anything unanticipated is caught at the executor
//! boundary as `Unexpected`.

/// Errors raised inside a repository scan
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Bad scheme or private/loopback host; the scan never starts
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// Clone timeout, non-zero git exit, or oversize repository; fatal for the scan
    #[error("clone failed: {message}")]
    Clone { message: String },

    /// External scanner missing, failing or emitting garbage; soft, recorded
    #[error("{tool}: {message}")]
    Tool { tool: String, message: String },

    /// Filesystem fault outside the per-file skip path
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything not anticipated above
    #[error("unexpected error: {message}")]
    Unexpected { message: String },
}

impl ScanError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn clone_failed(message: impl Into<String>) -> Self {
        Self::Clone {
            message: message.into(),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }
}
