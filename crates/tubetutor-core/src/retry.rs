//! Identity-rotating retry policy
//!
//! Runs an operation up to a fixed number of times, handing it a freshly
//! drawn egress identity on every attempt. Attempts are back-to-back: the
//! failures being retried are keyed to the source address, so waiting does
//! not help but switching identity does.

use std::fmt;
use std::future::Future;
use tracing::{debug, warn};

/// Source of egress identities for successive attempts
pub trait IdentitySource: Send + Sync {
    /// Identity handed to one attempt
    type Identity: fmt::Display + Send;

    /// Draw an identity. Draws are independent; repeats are allowed.
    fn select(&self) -> Self::Identity;
}

/// Outcome of a single attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The operation returned a payload
    Success,
    /// The operation failed with the given cause
    Failure(String),
}

/// Record of one attempt, kept for logging
#[derive(Debug, Clone)]
pub struct RetryAttempt {
    /// 0-based attempt index
    pub index: usize,
    /// Display label of the identity used
    pub identity: String,
    /// What happened
    pub outcome: AttemptOutcome,
}

impl fmt::Display for RetryAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AttemptOutcome::Success => {
                write!(f, "attempt {} via {}: ok", self.index + 1, self.identity)
            }
            AttemptOutcome::Failure(cause) => write!(
                f,
                "attempt {} via {}: {cause}",
                self.index + 1,
                self.identity
            ),
        }
    }
}

/// Every attempt failed
#[derive(Debug)]
pub struct RetryExhausted<E> {
    /// Number of attempts made
    pub attempts: usize,
    /// Error from the final attempt
    pub last_error: E,
}

/// Bounded retry with a new identity per attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    max_attempts: usize,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self::new(crate::config::FETCH_MAX_ATTEMPTS)
    }
}

impl RotationPolicy {
    /// Create a policy allowing `max_attempts` attempts (at least one).
    #[must_use]
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Attempt budget
    #[must_use]
    pub const fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Run `operation` until it succeeds or the budget is spent.
    ///
    /// `operation` receives the 0-based attempt index and the identity drawn
    /// for that attempt.
    ///
    /// # Errors
    ///
    /// Returns `RetryExhausted` with the last error once every attempt failed.
    pub async fn run<S, F, Fut, T, E>(
        &self,
        source: &S,
        mut operation: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        S: IdentitySource + ?Sized,
        F: FnMut(usize, S::Identity) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut index = 0;
        loop {
            let identity = source.select();
            let label = identity.to_string();

            match operation(index, identity).await {
                Ok(value) => {
                    let attempt = RetryAttempt {
                        index,
                        identity: label,
                        outcome: AttemptOutcome::Success,
                    };
                    debug!("{attempt}");
                    return Ok(value);
                }
                Err(error) => {
                    let attempt = RetryAttempt {
                        index,
                        identity: label,
                        outcome: AttemptOutcome::Failure(error.to_string()),
                    };
                    warn!("{attempt}");

                    index += 1;
                    if index >= self.max_attempts {
                        return Err(RetryExhausted {
                            attempts: index,
                            last_error: error,
                        });
                    }
                }
            }
        }
    }
}
