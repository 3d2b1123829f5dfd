//! Generated advice with bounded retries and rule-based fallback
//!
//! The retry loop is an explicit state machine:
//!
//! ```text
//! Attempting(n) --ok--------------------> Succeeded
//! Attempting(n) --fail, n < max, wait---> Attempting(n + 1)
//! Attempting(n) --fail, n == max--------> Exhausted -> fallback
//! any wait / attempt start, cancelled---> Cancelled -> fallback
//! ```
//!
//! Cancellation is observed before each attempt and during backoff waits,
//! never while a call is in flight.

use super::{build_prompt, AdviceRuleEngine};
use crate::error::AdvisorFailure;
use crate::models::{AdviceRequest, AdviceSource};
use crate::observability::{PipelineMetrics, StructuredLogger};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

/// Prefix placed before rule-based advice when generation is unavailable
pub const UNAVAILABLE_NOTICE: &str =
    "AI advice is currently unavailable. Here's some general guidance: ";

/// Default number of calls, including the first
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default pause between failed attempts
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Default upper bound on a single call
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// External text-generation service
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `prompt`
    async fn generate_content(&self, prompt: &str) -> Result<String, AdvisorFailure>;
}

/// Bounds on the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
            ..Self::default()
        }
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// At least one attempt is always made
    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// States of the retry loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    Attempting(u32),
    Succeeded(String),
    Exhausted,
    Cancelled,
}

/// Advice text plus how it was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advice {
    pub text: String,
    pub source: AdviceSource,
    /// Calls made to the service
    pub attempts: u32,
    /// Backoff waits started between attempts
    pub waits: u32,
}

/// Sender side of a cancellation signal
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiver side of a cancellation signal
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn channel() -> (CancelHandle, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, CancelSignal { rx: Some(rx) })
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Sleep for `duration`; returns false if cancelled first
    async fn wait(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let Some(rx) = &self.rx else {
            tokio::time::sleep_until(deadline).await;
            return true;
        };

        let mut rx = rx.clone();
        let cancelled = tokio::select! {
            _ = tokio::time::sleep_until(deadline) => return true,
            changed = rx.wait_for(|cancelled| *cancelled) => changed.is_ok(),
        };
        if cancelled {
            return false;
        }
        // Handle dropped without cancelling; sit out the rest of the wait
        tokio::time::sleep_until(deadline).await;
        true
    }
}

/// Produces advice from the text service, falling back to the rule engine
#[derive(Clone)]
pub struct GenerativeAdvisor {
    generator: Arc<dyn TextGenerator>,
    rules: AdviceRuleEngine,
    policy: RetryPolicy,
    metrics: PipelineMetrics,
    logger: StructuredLogger,
}

impl GenerativeAdvisor {
    pub fn new(generator: Arc<dyn TextGenerator>, policy: RetryPolicy) -> Self {
        Self {
            generator,
            rules: AdviceRuleEngine::new(),
            policy,
            metrics: PipelineMetrics::new(),
            logger: StructuredLogger::default(),
        }
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Advice for `request`; never fails
    pub async fn advise(&self, request: &AdviceRequest) -> Advice {
        self.advise_with_cancel(request, &CancelSignal::never()).await
    }

    /// Like [`advise`](Self::advise), abandoning retries once `cancel` fires
    pub async fn advise_with_cancel(&self, request: &AdviceRequest, cancel: &CancelSignal) -> Advice {
        let prompt = build_prompt(request);
        self.generate(request, &prompt, cancel).await
    }

    /// Run the retry state machine for an already-built prompt
    pub async fn generate(
        &self,
        request: &AdviceRequest,
        prompt: &str,
        cancel: &CancelSignal,
    ) -> Advice {
        let max_attempts = self.policy.attempts();
        let mut attempts = 0;
        let mut waits = 0;
        let mut state = AttemptState::Attempting(1);

        loop {
            debug!(state = ?state, "Advisor state");
            state = match state {
                AttemptState::Attempting(_) if cancel.is_cancelled() => AttemptState::Cancelled,
                AttemptState::Attempting(n) => {
                    attempts = n;
                    match self.attempt(prompt).await {
                        Ok(text) => AttemptState::Succeeded(text),
                        Err(failure) => {
                            self.metrics.inc_advisor_failures();
                            self.logger
                                .log_advisor_attempt_failed(n, max_attempts, &failure.to_string());
                            if n >= max_attempts {
                                AttemptState::Exhausted
                            } else {
                                waits += 1;
                                if cancel.wait(self.policy.backoff).await {
                                    AttemptState::Attempting(n + 1)
                                } else {
                                    AttemptState::Cancelled
                                }
                            }
                        }
                    }
                }
                AttemptState::Succeeded(text) => {
                    return Advice {
                        text,
                        source: AdviceSource::Generated,
                        attempts,
                        waits,
                    };
                }
                AttemptState::Exhausted => return self.fallback(request, attempts, waits, false),
                AttemptState::Cancelled => return self.fallback(request, attempts, waits, true),
            };
        }
    }

    async fn attempt(&self, prompt: &str) -> Result<String, AdvisorFailure> {
        self.metrics.inc_advisor_attempts();
        let text = tokio::time::timeout(
            self.policy.attempt_timeout,
            self.generator.generate_content(prompt),
        )
        .await
        .map_err(|_| AdvisorFailure::Timeout(self.policy.attempt_timeout))??;

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AdvisorFailure::EmptyResponse);
        }
        Ok(trimmed.to_string())
    }

    fn fallback(&self, request: &AdviceRequest, attempts: u32, waits: u32, cancelled: bool) -> Advice {
        self.metrics.inc_advisor_fallbacks();
        self.logger.log_advisor_fallback(attempts, cancelled);
        let guidance = self
            .rules
            .advise(&request.profile, request.prediction.cost);
        Advice {
            text: format!("{}{}", UNAVAILABLE_NOTICE, guidance),
            source: AdviceSource::Fallback,
            attempts,
            waits,
        }
    }
}
