//! Language-model calls with exponential backoff.
//!
//! The `llm` summarizer talks to an OpenAI-compatible endpoint through
//! `awful_aj`. Calls go through two layers:
//! - [`AskFnWrapper`]: adapts `awful_aj::api::ask` to [`AskAsync`]
//! - [`RetryAsk`]: decorator that retries any [`AskAsync`] with backoff
//!
//! # Retry Strategy
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=max_jitter)
//! ```
//!
//! Defaults: 5 retries, 1 second base, 30 second cap, 250ms jitter.

use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Async text-in, response-out call to a language model.
pub trait AskAsync {
    type Response;

    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Backoff parameters for [`RetryAsk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            max_jitter_ms: 250,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based), without jitter.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1) as u32)
            .unwrap_or(u32::MAX);
        Duration::from_millis(self.base_delay_ms)
            .saturating_mul(factor)
            .min(Duration::from_millis(self.max_delay_ms))
    }
}

/// Adds exponential backoff retries to any [`AskAsync`] implementation.
pub struct RetryAsk<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("policy", &self.policy)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.policy.max_retries {
                        error!(
                            attempt,
                            max = self.policy.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    let jitter_ms: u64 = if self.policy.max_jitter_ms == 0 {
                        0
                    } else {
                        rng().random_range(0..=self.policy.max_jitter_ms)
                    };
                    let delay = self.policy.backoff(attempt) + Duration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.policy.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// [`AskAsync`] over `awful_aj::api::ask` with a fixed config and template.
#[derive(Debug)]
pub struct AskFnWrapper<'a> {
    pub config: &'a AwfulJadeConfig,
    pub template: &'a ChatTemplate,
}

impl AskAsync for AskFnWrapper<'_> {
    type Response = String;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = ask(self.config, text.to_string(), self.template, None, None).await;
        if let Err(e) = &res {
            warn!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %e, "API call failed");
        }
        res
    }
}

/// Send `text` through the template with retries.
#[instrument(level = "info", skip_all, fields(chars = text.chars().count()))]
pub async fn ask_with_backoff(
    config: &AwfulJadeConfig,
    template: &ChatTemplate,
    text: &str,
    policy: RetryPolicy,
) -> Result<String, Box<dyn Error>> {
    let t0 = Instant::now();
    let api = RetryAsk::new(AskFnWrapper { config, template }, policy);
    let res = api.ask(text).await;
    let elapsed_ms_total = t0.elapsed().as_millis() as u64;

    match &res {
        Ok(_) => info!(elapsed_ms_total, "ask_with_backoff succeeded"),
        Err(e) => error!(elapsed_ms_total, error = %e, "ask_with_backoff failed"),
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// Fails a fixed number of times, then echoes the input.
    #[derive(Debug)]
    struct Flaky {
        failures_left: Cell<usize>,
        calls: Cell<usize>,
    }

    impl Flaky {
        fn new(failures: usize) -> Self {
            Self {
                failures_left: Cell::new(failures),
                calls: Cell::new(0),
            }
        }
    }

    impl AskAsync for Flaky {
        type Response = String;

        async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>> {
            self.calls.set(self.calls.get() + 1);
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err("temporarily unavailable".into());
            }
            Ok(text.to_uppercase())
        }
    }

    fn fast_policy(max_retries: usize) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay_ms: 1,
            max_delay_ms: 5,
            max_jitter_ms: 0,
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(5), Duration::from_secs(16));
        assert_eq!(policy.backoff(6), Duration::from_secs(30));
        assert_eq!(policy.backoff(80), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_retry_recovers_after_failures() {
        let api = RetryAsk::new(Flaky::new(2), fast_policy(5));
        let out = api.ask("hello").await.unwrap();
        assert_eq!(out, "HELLO");
        assert_eq!(api.inner.calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let api = RetryAsk::new(Flaky::new(10), fast_policy(2));
        assert!(api.ask("hello").await.is_err());
        // One initial attempt plus two retries.
        assert_eq!(api.inner.calls.get(), 3);
    }
}
