//! Bounded retry for advisor calls.
//!
//! One policy covers every advisor failure:
//! - Timeouts and network errors get exactly one more attempt, with a
//!   widened deadline and token budget
//! - HTTP errors, refusals and malformed replies are final
//!
//! Every attempt is bounded by the request deadline, whatever the advisor
//! implementation does with it.

use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::client::{AdviceCall, AdviceRequest, Advisor};
use crate::error::{AdvisorError, AdvisorResult, FailureKind};
use crate::metrics::record_call;

/// Retry policy configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Deadline used by retried attempts.
    pub widened_timeout: Duration,
    /// Token budget used by retried attempts.
    pub widened_max_tokens: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            widened_timeout: Duration::from_secs(20),
            widened_max_tokens: 600,
        }
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { timeout: Duration, max_tokens: u32 },
    GiveUp,
}

impl RetryPolicy {
    /// Never retry.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Decide after `attempts` failed attempts whose last failure was `kind`.
    pub fn decide(&self, attempts: u32, kind: FailureKind) -> RetryDecision {
        if kind.is_retryable() && attempts <= self.max_retries {
            RetryDecision::Retry {
                timeout: self.widened_timeout,
                max_tokens: self.widened_max_tokens,
            }
        } else {
            RetryDecision::GiveUp
        }
    }
}

/// Await `call`, failing with a timeout once `timeout` has passed.
pub async fn with_deadline<F>(timeout: Duration, call: F) -> AdvisorResult<String>
where
    F: Future<Output = AdvisorResult<String>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(AdvisorError::timeout(format!(
            "no reply within {}s",
            timeout.as_secs()
        ))),
    }
}

/// Run a suggestion request through `policy`.
pub async fn advise_with_retry<A>(advisor: &A, request: AdviceRequest, policy: &RetryPolicy) -> AdvisorResult<String>
where
    A: Advisor + ?Sized,
{
    let mut request = request;
    let mut attempts = 0u32;

    loop {
        let started = Instant::now();
        let result = with_deadline(request.timeout, advisor.advise(&request)).await;
        attempts += 1;

        match result {
            Ok(text) => {
                record_call(AdviceCall::Advice, "ok", started.elapsed());
                debug!(advisor = advisor.name(), attempts, "Advice received");
                return Ok(text);
            }
            Err(e) => {
                let kind = e.kind();
                record_call(AdviceCall::Advice, kind.as_str(), started.elapsed());

                match policy.decide(attempts, kind) {
                    RetryDecision::Retry { timeout, max_tokens } => {
                        warn!(
                            advisor = advisor.name(),
                            attempt = attempts,
                            kind = %kind,
                            timeout_secs = timeout.as_secs(),
                            "Advice call failed, retrying: {}",
                            e
                        );
                        request = request.widened(timeout, max_tokens);
                    }
                    RetryDecision::GiveUp => {
                        warn!(
                            advisor = advisor.name(),
                            attempts,
                            kind = %kind,
                            "Advice call failed: {}",
                            e
                        );
                        return Err(e);
                    }
                }
            }
        }
    }
}
