//! Retrying HTTP transport
//!
//! [`RetryTransport`] sends one [`HttpAttempt`] up to `retry_max + 1` times.
//! After every attempt a [`RetryPolicy`] decides whether to try again, and a
//! [`Backoff`] decides how long to wait first. Both are pluggable and accept
//! plain functions.
//!
//! When retries run out the transport hands back whatever it last got: the
//! transport error, or the last response so the caller can still turn its
//! status into an [`ApiError`](crate::error::ApiError).

use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::logging::Logger;
use crate::request::HttpAttempt;
use opsgenie_core::retry::{is_retryable_status, retry_after, BackoffConfig, DEFAULT_RETRY_COUNT};
use reqwest::header::RETRY_AFTER;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// What to do after an attempt
#[derive(Debug)]
pub enum RetryDecision {
    /// Send another attempt after backing off
    Retry,
    /// Hand the outcome back as is
    Stop,
    /// Abandon the call with this error
    Fail(Error),
}

/// Result of a single attempt, as seen by the retry policy
#[derive(Debug, Clone, Copy)]
pub enum AttemptOutcome<'a> {
    /// The server answered
    Response(&'a reqwest::Response),
    /// No response was received
    Error(&'a reqwest::Error),
}

impl AttemptOutcome<'_> {
    /// Status code, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Response(response) => Some(response.status().as_u16()),
            Self::Error(_) => None,
        }
    }
}

/// Decides whether an attempt should be repeated
pub trait RetryPolicy: Send + Sync {
    /// Inspect the context and the attempt's outcome
    fn decide(&self, ctx: &RequestContext, outcome: AttemptOutcome<'_>) -> RetryDecision;
}

impl<F> RetryPolicy for F
where
    F: Fn(&RequestContext, AttemptOutcome<'_>) -> RetryDecision + Send + Sync,
{
    fn decide(&self, ctx: &RequestContext, outcome: AttemptOutcome<'_>) -> RetryDecision {
        self(ctx, outcome)
    }
}

/// Computes the wait before the next attempt
pub trait Backoff: Send + Sync {
    /// `attempt` is zero for the wait after the first attempt
    fn delay(
        &self,
        attempt: u32,
        min: Duration,
        max: Duration,
        last: Option<&reqwest::Response>,
    ) -> Duration;
}

impl<F> Backoff for F
where
    F: Fn(u32, Duration, Duration, Option<&reqwest::Response>) -> Duration + Send + Sync,
{
    fn delay(
        &self,
        attempt: u32,
        min: Duration,
        max: Duration,
        last: Option<&reqwest::Response>,
    ) -> Duration {
        self(attempt, min, max, last)
    }
}

/// Retry policy used unless one is configured
///
/// Stops with the context's error once it is done, retries every transport
/// error, retries 429 and server errors other than 501, and stops otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRetryPolicy;

impl DefaultRetryPolicy {
    /// Decision for a status, or for a transport error when `status` is `None`
    pub fn decide_status(ctx: &RequestContext, status: Option<u16>) -> RetryDecision {
        if let Some(err) = ctx.err() {
            return RetryDecision::Fail(Error::Context(err));
        }
        match status {
            None => RetryDecision::Retry,
            Some(status) if is_retryable_status(status) => RetryDecision::Retry,
            Some(_) => RetryDecision::Stop,
        }
    }
}

impl RetryPolicy for DefaultRetryPolicy {
    fn decide(&self, ctx: &RequestContext, outcome: AttemptOutcome<'_>) -> RetryDecision {
        Self::decide_status(ctx, outcome.status())
    }
}

/// Exponential backoff with jitter, honouring `Retry-After` on 429 and 503
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    jitter: bool,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self { jitter: true }
    }
}

impl ExponentialBackoff {
    /// Deterministic variant
    #[must_use]
    pub fn without_jitter() -> Self {
        Self { jitter: false }
    }

    /// Wait for `attempt` given the last status and its `Retry-After` value
    pub fn delay_for(
        &self,
        attempt: u32,
        min: Duration,
        max: Duration,
        status: Option<u16>,
        retry_after_header: Option<&str>,
    ) -> Duration {
        if let Some(wait) = status.and_then(|s| retry_after(s, retry_after_header)) {
            return wait.min(max);
        }
        let mut config = BackoffConfig::new(min, max);
        config.jitter = self.jitter;
        config.delay_for_attempt(attempt)
    }
}

impl Backoff for ExponentialBackoff {
    fn delay(
        &self,
        attempt: u32,
        min: Duration,
        max: Duration,
        last: Option<&reqwest::Response>,
    ) -> Duration {
        let status = last.map(|r| r.status().as_u16());
        let header = last
            .and_then(|r| r.headers().get(RETRY_AFTER))
            .and_then(|v| v.to_str().ok());
        self.delay_for(attempt, min, max, status, header)
    }
}

/// HTTP client with retries, backoff and cancellation
#[derive(Clone)]
pub struct RetryTransport {
    client: reqwest::Client,
    policy: Arc<dyn RetryPolicy>,
    backoff: Arc<dyn Backoff>,
    retry_max: u32,
    wait: BackoffConfig,
    logger: Logger,
}

impl fmt::Debug for RetryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryTransport")
            .field("retry_max", &self.retry_max)
            .field("wait_min", &self.wait.min_wait)
            .field("wait_max", &self.wait.max_wait)
            .finish_non_exhaustive()
    }
}

impl RetryTransport {
    /// Transport with the default policy, backoff and retry count
    pub fn new(client: reqwest::Client, logger: Logger) -> Self {
        Self {
            client,
            policy: Arc::new(DefaultRetryPolicy),
            backoff: Arc::new(ExponentialBackoff::default()),
            retry_max: DEFAULT_RETRY_COUNT,
            wait: BackoffConfig::default(),
            logger,
        }
    }

    /// Builder-style method to set the retry policy
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Builder-style method to set the backoff
    #[must_use]
    pub fn with_backoff(mut self, backoff: Arc<dyn Backoff>) -> Self {
        self.backoff = backoff;
        self
    }

    /// Builder-style method to set the retries allowed after the first attempt
    #[must_use]
    pub fn with_retry_max(mut self, retry_max: u32) -> Self {
        self.retry_max = retry_max;
        self
    }

    /// Builder-style method to set the bounds passed to the backoff
    #[must_use]
    pub fn with_wait_bounds(mut self, min: Duration, max: Duration) -> Self {
        self.wait = BackoffConfig::new(min, max);
        self
    }

    /// Retries allowed after the first attempt
    pub fn retry_max(&self) -> u32 {
        self.retry_max
    }

    /// Send `attempt`, retrying per policy, until a final outcome
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        attempt: &HttpAttempt,
    ) -> Result<reqwest::Response> {
        let max_attempts = self.retry_max.saturating_add(1);
        let mut sent = 0u32;

        loop {
            if let Some(err) = ctx.err() {
                return Err(err.into());
            }
            sent += 1;

            let started = Instant::now();
            let outcome = tokio::select! {
                biased;
                err = ctx.done() => return Err(err.into()),
                outcome = self.client.execute(attempt.to_request()) => outcome,
            };

            let decision = match &outcome {
                Ok(response) => {
                    debug!(
                        attempt = sent,
                        status = response.status().as_u16(),
                        elapsed_ms = started.elapsed().as_millis(),
                        "Attempt completed"
                    );
                    self.policy.decide(ctx, AttemptOutcome::Response(response))
                }
                Err(e) => {
                    debug!(
                        attempt = sent,
                        error = %e,
                        elapsed_ms = started.elapsed().as_millis(),
                        "Attempt failed"
                    );
                    self.policy.decide(ctx, AttemptOutcome::Error(e))
                }
            };

            match decision {
                RetryDecision::Stop => return outcome.map_err(Error::from),
                RetryDecision::Fail(err) => return Err(self.unable_to_send(err)),
                RetryDecision::Retry if sent >= max_attempts => return self.exhausted(outcome, sent),
                RetryDecision::Retry => {}
            }

            let delay = self.backoff.delay(
                sent - 1,
                self.wait.min_wait,
                self.wait.max_wait,
                outcome.as_ref().ok(),
            );
            drop(outcome);

            debug!(
                attempt = sent,
                delay_ms = delay.as_millis(),
                "Retrying after delay"
            );

            tokio::select! {
                biased;
                err = ctx.done() => return Err(err.into()),
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn unable_to_send(&self, err: Error) -> Error {
        self.logger.error(&format!("Unable to send the request {err}"));
        err
    }

    fn exhausted(
        &self,
        outcome: reqwest::Result<reqwest::Response>,
        attempts: u32,
    ) -> Result<reqwest::Response> {
        match outcome {
            Err(e) => Err(self.unable_to_send(e.into())),
            Ok(response) => {
                self.logger
                    .error(&format!("Failed to process request after {attempts} retries."));
                Ok(response)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextError;
    use proptest::prelude::*;

    #[test]
    fn test_default_policy_truth_table() {
        let ctx = RequestContext::background();
        let retries = |status| matches!(DefaultRetryPolicy::decide_status(&ctx, status), RetryDecision::Retry);

        assert!(retries(None));
        assert!(retries(Some(0)));
        assert!(retries(Some(429)));
        assert!(retries(Some(500)));
        assert!(retries(Some(503)));
        assert!(!retries(Some(501)));
        assert!(!retries(Some(200)));
        assert!(!retries(Some(302)));
        assert!(!retries(Some(404)));
    }

    #[test]
    fn test_default_policy_fails_on_done_context() {
        let ctx = RequestContext::background();
        ctx.cancel();
        match DefaultRetryPolicy::decide_status(&ctx, Some(503)) {
            RetryDecision::Fail(Error::Context(ContextError::Canceled)) => {}
            other => panic!("unexpected decision {other:?}"),
        }
    }

    #[test]
    fn test_exponential_backoff_without_jitter() {
        let backoff = ExponentialBackoff::without_jitter();
        let min = Duration::from_millis(100);
        let max = Duration::from_secs(1);

        assert_eq!(backoff.delay_for(0, min, max, Some(500), None), min);
        assert_eq!(backoff.delay_for(2, min, max, Some(500), None), Duration::from_millis(400));
        assert_eq!(backoff.delay_for(9, min, max, None, None), max);
    }

    #[test]
    fn test_retry_after_wins_and_is_capped() {
        let backoff = ExponentialBackoff::without_jitter();
        let min = Duration::from_millis(100);
        let max = Duration::from_secs(10);

        assert_eq!(backoff.delay_for(0, min, max, Some(429), Some("2")), Duration::from_secs(2));
        assert_eq!(backoff.delay_for(0, min, max, Some(503), Some("120")), max);
        assert_eq!(backoff.delay_for(0, min, max, Some(500), Some("2")), min);
    }

    fn never(_: &RequestContext, _: AttemptOutcome<'_>) -> RetryDecision {
        RetryDecision::Stop
    }

    fn constant(_: u32, _: Duration, _: Duration, _: Option<&reqwest::Response>) -> Duration {
        Duration::from_millis(5)
    }

    #[test]
    fn test_functions_are_hooks() {
        let transport = RetryTransport::new(reqwest::Client::new(), Logger::default())
            .with_policy(Arc::new(never))
            .with_backoff(Arc::new(constant))
            .with_retry_max(2);
        assert_eq!(transport.retry_max(), 2);
        assert_eq!(
            transport.backoff.delay(3, Duration::ZERO, Duration::ZERO, None),
            Duration::from_millis(5)
        );
    }

    proptest! {
        #[test]
        fn prop_policy_matches_status_table(status in 0u16..1000) {
            let ctx = RequestContext::background();
            let retried = matches!(DefaultRetryPolicy::decide_status(&ctx, Some(status)), RetryDecision::Retry);
            let expected = status == 0 || status == 429 || (status >= 500 && status != 501);
            prop_assert_eq!(retried, expected);
        }
    }
}
