//! Common error types used throughout animatch.
//!
//! This module provides a unified error type for talking to the remote
//! catalogue: not found, transient remote failures, timeouts, malformed
//! payloads and I/O failures.

/// Common error type for animatch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested item was not found.
    #[error("Item not found: {0}")]
    NotFound(String),

    /// The remote catalogue failed in a way that may succeed on retry.
    #[error("Remote service error: {0}")]
    Remote(String),

    /// A remote call did not finish within the configured deadline.
    #[error("Remote call timed out after {0} ms")]
    Timeout(u64),

    /// The remote catalogue returned a payload that could not be understood.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Remote error.
    pub fn remote<S: Into<String>>(msg: S) -> Self {
        Self::Remote(msg.into())
    }

    /// Create a new Malformed error.
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::Malformed(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether the caller may retry the operation later.
    ///
    /// Transient remote failures and timeouts are retryable; everything else
    /// will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Remote(_) | Self::Timeout(_))
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("subject 975");
        assert_eq!(err.to_string(), "Item not found: subject 975");

        let err = Error::remote("503 Service Unavailable");
        assert_eq!(err.to_string(), "Remote service error: 503 Service Unavailable");

        let err = Error::Timeout(500);
        assert_eq!(err.to_string(), "Remote call timed out after 500 ms");

        let err = Error::malformed("missing field `sort`");
        assert_eq!(err.to_string(), "Malformed response: missing field `sort`");

        let err = Error::invalid_input("bad id");
        assert_eq!(err.to_string(), "Invalid input: bad id");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_retryable() {
        assert!(Error::remote("connection reset").is_retryable());
        assert!(Error::Timeout(10).is_retryable());
        assert!(!Error::not_found("x").is_retryable());
        assert!(!Error::malformed("x").is_retryable());
        assert!(!Error::invalid_input("x").is_retryable());
    }
}
