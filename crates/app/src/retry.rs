//! Bounded retry for actuation calls.
//!
//! Transient failures ([`ActuationError::is_transient`]) are retried up to
//! `max_attempts` in total; a permanent failure returns on the first attempt.
//! Bulk operations run every target to completion and collect the failures
//! into one [`BatchReport`].

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tidyhub_domain::command::Command;
use tidyhub_domain::error::{ActuationError, BatchFailure, TargetFailure};

use crate::ports::CommandInvoker;

/// Delay growth between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed,
    Doubling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(1))
    }
}

impl RetryPolicy {
    pub const MAX_ATTEMPTS: u32 = 3;

    #[must_use]
    pub fn fixed(delay: Duration) -> Self {
        Self {
            max_attempts: Self::MAX_ATTEMPTS,
            delay,
            backoff: Backoff::Fixed,
        }
    }

    #[must_use]
    pub fn doubling(delay: Duration) -> Self {
        Self {
            max_attempts: Self::MAX_ATTEMPTS,
            delay,
            backoff: Backoff::Doubling,
        }
    }

    /// Pause after the given failed attempt (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Doubling => self
                .delay
                .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1))),
        }
    }

    /// Run `op` until it succeeds, fails permanently, or runs out of attempts.
    ///
    /// # Errors
    ///
    /// Returns the last [`ActuationError`] seen.
    pub async fn run<F, Fut>(&self, label: &str, mut op: F) -> Result<(), ActuationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), ActuationError>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(()) => return Ok(()),
                Err(err) if !err.is_transient() => {
                    tracing::warn!(target_name = label, attempt, error = %err, "permanent failure, not retrying");
                    return Err(err);
                }
                Err(err) if attempt >= self.max_attempts => {
                    tracing::warn!(target_name = label, attempt, error = %err, "giving up after retries");
                    return Err(err);
                }
                Err(err) => {
                    let delay = self.delay_after(attempt);
                    tracing::debug!(target_name = label, attempt, error = %err, ?delay, "retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Invoke `command` with retries.
    ///
    /// # Errors
    ///
    /// Returns the last [`ActuationError`] seen.
    pub async fn invoke<C: CommandInvoker>(
        &self,
        invoker: &C,
        command: &Command,
    ) -> Result<(), ActuationError> {
        let label = command
            .target()
            .map_or_else(|| command.service(), |target| target.to_string());
        self.run(&label, || invoker.invoke(command.clone())).await
    }

    /// Invoke every command with retries; one failure never stops the rest.
    pub async fn invoke_all<C: CommandInvoker>(
        &self,
        invoker: &C,
        commands: Vec<Command>,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        for command in commands {
            match self.invoke(invoker, &command).await {
                Ok(()) => report.dispatched.push(command),
                Err(error) => report.failures.push(TargetFailure {
                    target: command
                        .target()
                        .map_or_else(|| command.service(), |target| target.to_string()),
                    error,
                }),
            }
        }
        report
    }
}

/// Outcome of a bulk operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub dispatched: Vec<Command>,
    #[serde(serialize_with = "serialize_failures")]
    pub failures: Vec<TargetFailure>,
}

impl BatchReport {
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.dispatched.len() + self.failures.len()
    }

    /// Summarise the failures, if any, into one [`BatchFailure`].
    ///
    /// # Errors
    ///
    /// Returns the summary when at least one target failed.
    pub fn check(&self, operation: &'static str) -> Result<(), BatchFailure> {
        BatchFailure::check(operation, self.attempted(), self.failures.clone())
    }

    /// Log the failures as a single warning.
    pub fn log_failures(&self, operation: &'static str) {
        if let Err(summary) = self.check(operation) {
            tracing::warn!(error = %summary, "bulk operation partially failed");
        }
    }
}

#[derive(Serialize)]
struct FailureView<'a> {
    target: &'a str,
    error: String,
}

fn serialize_failures<S: serde::Serializer>(
    failures: &[TargetFailure],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(failures.iter().map(|failure| FailureView {
        target: &failure.target,
        error: failure.error.to_string(),
    }))
}
