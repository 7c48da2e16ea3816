//! Cancellation and deadlines for remote calls.

use std::future::Future;
use std::time::Duration;

use animatch_common::Error;
use tokio_util::sync::CancellationToken;

use crate::error::{ResolveError, Result};

/// Wraps every remote call of one resolution.
///
/// A call races against the cancellation token and the request timeout;
/// cancellation wins over both the result and the deadline.
#[derive(Debug, Clone)]
pub struct CallGuard {
    cancel: CancellationToken,
    timeout: Duration,
}

impl CallGuard {
    pub fn new(cancel: CancellationToken, timeout: Duration) -> Self {
        Self { cancel, timeout }
    }

    /// Fail with [`ResolveError::Cancelled`] if the token has fired.
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(ResolveError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run a remote call under the guard.
    pub async fn call<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = animatch_common::Result<T>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ResolveError::Cancelled),
            outcome = tokio::time::timeout(self.timeout, fut) => match outcome {
                Ok(result) => result.map_err(ResolveError::from),
                Err(_) => Err(ResolveError::Remote(Error::Timeout(
                    self.timeout.as_millis() as u64,
                ))),
            },
        }
    }
}
