//! Bounded retry loop for transport requests.

use crate::utils::errors::{NetworkError, SyncError, TransientCause};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 5;

/// Pause between two attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Outcome of a single failed attempt.
#[derive(Debug)]
pub enum AttemptError {
    /// Connection-level failure; worth another try
    Transient(TransientCause),
    /// Anything else (HTTP status, local I/O); returned as is
    Fatal(SyncError),
}

impl From<SyncError> for AttemptError {
    fn from(err: SyncError) -> Self {
        AttemptError::Fatal(err)
    }
}

impl From<std::io::Error> for AttemptError {
    fn from(err: std::io::Error) -> Self {
        AttemptError::Fatal(SyncError::Io(err))
    }
}

/// Run `attempt` until it succeeds, fails fatally, or `policy.retries`
/// retries have been spent on transient failures.
pub async fn with_retries<T, F, Fut>(policy: &RetryPolicy, url: &str, mut attempt: F) -> Result<T, SyncError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let mut retries_left = policy.retries;

    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(AttemptError::Fatal(err)) => return Err(err),
            Err(AttemptError::Transient(cause)) => {
                if retries_left == 0 {
                    return Err(NetworkError::RetriesExhausted {
                        url: url.to_string(),
                        retries: policy.retries,
                        source: cause,
                    }
                    .into());
                }
                retries_left -= 1;
                warn!(
                    "Request for {} failed: {} (retrying in {:?}, {} retries left)",
                    url, cause, policy.delay, retries_left
                );
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}
