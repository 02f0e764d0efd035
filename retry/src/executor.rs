use crate::config::RetryConfig;
use crate::error::{Classify, RetryError};
use log::warn;
use rand::rngs::OsRng;
use rand::Rng;
use std::fmt;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// How many attempts an operation gets, and the label its errors carry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    context: String,
    max_retries: u32,
}

impl RetryPolicy {
    /// `max_retries` below 1 still allows one attempt.
    pub fn new<S: Into<String>>(context: S, max_retries: u32) -> Self {
        RetryPolicy {
            context: context.into(),
            max_retries: max_retries.max(1),
        }
    }

    pub fn from_config<S: Into<String>>(context: S, config: &RetryConfig) -> Self {
        RetryPolicy::new(context, config.max_retries)
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

/// Runs an operation until it succeeds, fails fatally, or runs out of attempts.
///
/// Between attempts it sleeps with exponential backoff plus jitter drawn
/// from the OS RNG. The sleep is the only point where cancellation is
/// observed; an attempt already in flight always runs to completion.
#[derive(Clone, Debug, Default)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        RetryExecutor { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub async fn run<T, E, F, Fut>(
        &self,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        let max_retries = policy.max_retries();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if err.is_fatal() {
                warn!(
                    target: "retry",
                    "{} attempt {}/{} failed fatally: {}",
                    policy.context(),
                    attempt,
                    max_retries,
                    err
                );
                return Err(RetryError::Fatal(err));
            }
            warn!(
                target: "retry",
                "{} attempt {}/{} failed: {}", policy.context(), attempt, max_retries, err
            );
            if attempt >= max_retries {
                return Err(RetryError::Exhausted {
                    context: policy.context().to_owned(),
                    max_retries,
                    last_error: err,
                });
            }

            let delay = self.config.delay(attempt, self.jitter_ms());
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(RetryError::Cancelled {
                        context: policy.context().to_owned(),
                        attempts: attempt,
                    });
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn jitter_ms(&self) -> u64 {
        if self.config.jitter_ms == 0 {
            0
        } else {
            OsRng.gen_range(0..self.config.jitter_ms)
        }
    }
}

/// Retry with the default backoff and no way to cancel.
pub async fn run_with_retry<T, E, F, Fut>(
    operation: F,
    context: &str,
    max_retries: u32,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + fmt::Display,
{
    run_with_retry_cancellable(operation, context, max_retries, &CancellationToken::new()).await
}

pub async fn run_with_retry_cancellable<T, E, F, Fut>(
    operation: F,
    context: &str,
    max_retries: u32,
    cancel: &CancellationToken,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + fmt::Display,
{
    RetryExecutor::default()
        .run(&RetryPolicy::new(context, max_retries), cancel, operation)
        .await
}
