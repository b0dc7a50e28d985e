//! The poll-until engine.
//!
//! A [`Wait`] owns one deadline and one polling interval, created at
//! call entry and discarded at call exit; nothing is shared across
//! calls. [`Wait::until`] re-evaluates its predicate fresh against the
//! current document state on every iteration, never caching a result
//! across polls, so a success is always the *first* iteration at which
//! the condition held.
//!
//! Predicate contract:
//!
//! - `Ok(Some(value))` — condition holds, `value` is returned.
//! - `Ok(None)` — not yet; retried after the interval.
//! - `Err(e)` where [`e.is_transient()`](crate::Error::is_transient) —
//!   the document moved under the query (element detached mid-check);
//!   treated as "not yet". If the deadline expires the last such error
//!   surfaces inside the timeout diagnostic.
//! - any other `Err` — propagated immediately, no retry.
//!
//! Polling is a cooperative, caller-blocking loop: the only suspension
//! point is the sleep between iterations, and the only way out besides
//! success is deadline expiry. There is no cancellation token.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

use crate::driver::WebDriver;
use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default pause between poll iterations.
///
/// Short relative to any sane timeout; the exact value is not part of
/// the contract.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

// ============================================================================
// Wait
// ============================================================================

/// One poll-until invocation's context: driver handle, deadline, interval.
#[derive(Clone)]
pub struct Wait {
    driver: Arc<dyn WebDriver>,
    timeout: Duration,
    interval: Duration,
}

impl Wait {
    /// Creates a wait context with the default poll interval.
    pub fn new(driver: Arc<dyn WebDriver>, timeout: Duration) -> Self {
        Self {
            driver,
            timeout,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Overrides the poll interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Returns the configured timeout.
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the configured poll interval.
    #[inline]
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Polls `predicate` until it yields a value or the deadline expires.
    ///
    /// The predicate receives the driver handle and is evaluated once
    /// immediately, then once per interval. On deadline expiry the
    /// failure is [`Error::Timeout`] carrying `message`, the elapsed
    /// time, and the text of the final iteration's transient error if
    /// one occurred.
    ///
    /// A zero timeout or zero interval is a caller programming error
    /// and fails with [`Error::InvalidArgument`] before any polling.
    pub async fn until<T, F>(&self, mut predicate: F, message: impl Into<String>) -> Result<T>
    where
        T: Send,
        F: FnMut(Arc<dyn WebDriver>) -> BoxFuture<'static, Result<Option<T>>> + Send,
    {
        if self.timeout.is_zero() {
            return Err(Error::invalid_argument(
                "wait timeout must be greater than zero",
            ));
        }
        if self.interval.is_zero() {
            return Err(Error::invalid_argument(
                "poll interval must be greater than zero",
            ));
        }

        let message = message.into();
        let start = Instant::now();
        // Assigned by every match arm that falls through to the
        // deadline check below.
        let mut last_transient: Option<Error>;

        loop {
            match predicate(Arc::clone(&self.driver)).await {
                Ok(Some(value)) => {
                    debug!(
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Wait condition satisfied"
                    );
                    return Ok(value);
                }
                Ok(None) => {
                    trace!("Wait condition not yet satisfied");
                    last_transient = None;
                }
                Err(err) if err.is_transient() => {
                    trace!(error = %err, "Transient error during poll, retrying");
                    last_transient = Some(err);
                }
                Err(err) => return Err(err),
            }

            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                debug!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Wait deadline expired"
                );
                return Err(Error::wait_timeout(
                    message,
                    self.timeout,
                    elapsed,
                    last_transient.as_ref(),
                ));
            }

            sleep(self.interval).await;
        }
    }
}

impl std::fmt::Debug for Wait {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wait")
            .field("timeout", &self.timeout)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
