//! Bounded retry with exponential backoff
//!
//! Used for eventual-consistency waits, such as the profile row a backend
//! trigger creates shortly after signup.

use axiom_core::RemoteError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_millis(4000),
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1` (1-based `attempt`)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryError {
    /// Every attempt came back empty or with a transient failure
    #[error("gave up after {attempts} attempts")]
    Exhausted { attempts: u32 },

    /// A failure that retrying cannot fix
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Run `attempt` until it yields a value
///
/// `Ok(None)` and transient errors (network, timeout) are retried after the
/// policy's backoff; any other error aborts immediately.
pub async fn retry_until<T, F, Fut>(policy: &RetryPolicy, mut attempt: F) -> Result<T, RetryError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>, RemoteError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    for n in 1..=max_attempts {
        match attempt(n).await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => debug!(attempt = n, "Not ready yet"),
            Err(err) if err.is_transient() => debug!(attempt = n, error = %err, "Transient failure"),
            Err(err) => return Err(err.into()),
        }
        if n < max_attempts {
            tokio::time::sleep(policy.backoff(n)).await;
        }
    }
    Err(RetryError::Exhausted {
        attempts: max_attempts,
    })
}
