//! Retry-until-ready probing for external dependencies at startup.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// How long to keep probing a dependency before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Total number of probe attempts (at least one is always made).
    pub max_attempts: u32,
    /// Fixed pause between failed attempts.
    pub delay: Duration,
}

impl WaitPolicy {
    /// Creates a policy with the given attempt budget and delay.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            delay: Duration::from_secs(2),
        }
    }
}

/// The dependency never became ready within the policy's budget.
#[derive(Debug, Error)]
#[error("{dependency} not ready after {attempts} attempts: {last_error}")]
pub struct WaitError {
    pub dependency: String,
    pub attempts: u32,
    pub last_error: String,
}

/// Calls `probe` until it succeeds or the attempt budget runs out.
///
/// Returns the value of the first successful probe. Each failure is logged
/// with its attempt number before sleeping `policy.delay`.
pub async fn wait_for<T, E, F, Fut>(
    dependency: &str,
    policy: WaitPolicy,
    mut probe: F,
) -> Result<T, WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        match probe().await {
            Ok(value) => {
                tracing::info!(dependency, attempt, "dependency ready");
                return Ok(value);
            }
            Err(e) => {
                last_error = e.to_string();
                tracing::warn!(
                    dependency,
                    attempt,
                    max_attempts,
                    error = %last_error,
                    "dependency not ready yet"
                );
                if attempt < max_attempts {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }

    tracing::error!(dependency, max_attempts, "giving up on dependency");
    Err(WaitError {
        dependency: dependency.to_string(),
        attempts: max_attempts,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_returns_first_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = wait_for("db", WaitPolicy::new(5, Duration::from_secs(2)), move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 { Err("refused") } else { Ok(n) }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), WaitError> =
            wait_for("db", WaitPolicy::new(4, Duration::from_millis(10)), move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("connection refused")
                }
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 4);
        assert_eq!(err.last_error, "connection refused");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(
            err.to_string(),
            "db not ready after 4 attempts: connection refused"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_probes_once() {
        let result = wait_for("db", WaitPolicy::new(0, Duration::ZERO), || async {
            Ok::<_, String>("up")
        })
        .await;
        assert_eq!(result.unwrap(), "up");
    }
}
