//! Errors surfaced by the resolution pipeline.
//!
//! Only two outcomes are actionable for a caller: the resolution was
//! cancelled, or the remote catalogue failed. A file that matches nothing is
//! not an error; it resolves to `Ok(None)` or to a synthesized record.

use animatch_common::Error as CommonError;

/// Failure of a resolution call.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The caller cancelled the resolution. Not a confirmed absence of metadata.
    #[error("Resolution cancelled")]
    Cancelled,

    /// The remote catalogue failed.
    #[error(transparent)]
    Remote(#[from] CommonError),
}

impl ResolveError {
    /// Whether the same resolution may succeed if tried again later.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Cancelled => false,
            Self::Remote(err) => err.is_retryable(),
        }
    }

    /// `true` for [`ResolveError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result alias for the resolution pipeline.
pub type Result<T> = std::result::Result<T, ResolveError>;
