//! Bounded retry policy for remote calls.

use crate::error::RecallError;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::warn;

/// Errors that can tell whether a retry is worthwhile.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for RecallError {
    fn is_transient(&self) -> bool {
        RecallError::is_transient(self)
    }
}

/// Exponential backoff with jitter, capped at `max_retries` extra attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero disables retrying.
    pub max_retries: usize,
    /// Delay before the first retry, in milliseconds. Doubles afterwards.
    pub initial_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 250,
            max_delay_ms: 4_000,
        }
    }
}

impl RetryPolicy {
    /// A policy that performs the call exactly once.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn delays(&self) -> impl Iterator<Item = Duration> {
        let factor = (self.initial_delay_ms / 2).max(1);
        ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(Duration::from_millis(self.max_delay_ms))
            .map(jitter)
            .take(self.max_retries)
    }

    /// Run `action`, retrying while it fails with a transient error.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, action: F) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Transient + Display,
    {
        RetryIf::start(self.delays(), action, |e: &E| {
            let transient = e.is_transient();
            if transient {
                warn!("{} failed, retrying: {}", operation, e);
            }
            transient
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast(max_retries: usize) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay_ms: 1,
            max_delay_ms: 2,
        }
    }

    #[tokio::test]
    async fn test_retries_transient_errors_until_success() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;
        let result: Result<u32, RecallError> = fast(3)
            .run("flaky call", move || async move {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(RecallError::ProviderUnavailable("503".to_string()))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_errors() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;
        let result: Result<u32, RecallError> = fast(3)
            .run("bad call", move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(RecallError::Provider("400".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_none_policy_makes_single_attempt() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;
        let result: Result<u32, RecallError> = RetryPolicy::none()
            .run("single call", move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(RecallError::ProviderUnavailable("timeout".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
