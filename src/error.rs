//! Error types for webdriver-waits.
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use webdriver_waits::{Result, Session};
//!
//! async fn example(session: &Session) -> Result<()> {
//!     let element = session.element("#submit").await?;
//!     element.click().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Waiting | [`Error::Timeout`] |
//! | Lookup | [`Error::NotFound`], [`Error::StaleElement`], [`Error::InvalidSelector`] |
//! | Caller misuse | [`Error::InvalidArgument`] |
//! | Driver | [`Error::ScriptError`], [`Error::Driver`] |
//! | External | [`Error::Json`] |
//!
//! [`Error::NotFound`] and [`Error::StaleElement`] are *transient*: inside
//! a poll loop they mean "not yet" and are retried until the deadline.
//! Every other variant propagates immediately.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;
use std::time::Duration;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Waiting
    // ========================================================================
    /// A wait-based operation ran out of time.
    ///
    /// The canonical failure for every condition in [`crate::expect`]:
    /// carries the message describing what was expected, the configured
    /// deadline and the wall time actually observed. This is the only
    /// error callers are expected to catch and retry at a higher level.
    #[error("Timed out after {elapsed_ms}ms (timeout {timeout_ms}ms): {message}")]
    Timeout {
        /// What was being waited for (names the locator/expected value).
        message: String,
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
        /// Milliseconds elapsed when the deadline was declared expired.
        elapsed_ms: u64,
    },

    // ========================================================================
    // Lookup
    // ========================================================================
    /// No element matched the locator.
    ///
    /// Transient during polling; terminal on a direct one-shot lookup.
    #[error("No element found: {locator}")]
    NotFound {
        /// Human-readable locator description.
        locator: String,
    },

    /// A previously located node is no longer attached to the document.
    ///
    /// Transient during polling; terminal on a direct one-shot action.
    #[error("Stale element: {node}")]
    StaleElement {
        /// Identifier of the detached node.
        node: String,
    },

    /// The selector is valid as neither CSS nor XPath.
    ///
    /// Classification defaults such strings to XPath, so this surfaces
    /// at find-time from the driver rather than from the classifier.
    #[error("Invalid selector `{selector}`: {message}")]
    InvalidSelector {
        /// The offending selector string.
        selector: String,
        /// Driver-side description of the syntax failure.
        message: String,
    },

    // ========================================================================
    // Caller Misuse
    // ========================================================================
    /// Invalid argument from the caller.
    ///
    /// Fails fast, before any polling begins.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // Driver
    // ========================================================================
    /// JavaScript execution failed in the page.
    #[error("Script error: {message}")]
    ScriptError {
        /// Error message from script execution.
        message: String,
    },

    /// Opaque failure inside the underlying driver.
    ///
    /// Connection loss, protocol violations and everything else this
    /// layer does not model; never retried.
    #[error("Driver error: {message}")]
    Driver {
        /// Description of the driver-side failure.
        message: String,
    },

    // ========================================================================
    // External
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a timeout error for a wait that expired.
    ///
    /// When the final poll iteration failed with a transient error, pass
    /// it as `last` so its text surfaces in the diagnostic.
    #[must_use]
    pub fn wait_timeout(
        message: impl Into<String>,
        timeout: Duration,
        elapsed: Duration,
        last: Option<&Error>,
    ) -> Self {
        let mut message = message.into();
        if let Some(err) = last {
            message.push_str("; last error: ");
            message.push_str(&err.to_string());
        }
        Self::Timeout {
            message,
            timeout_ms: timeout.as_millis() as u64,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    /// Creates a not found error.
    #[inline]
    pub fn not_found(locator: impl Into<String>) -> Self {
        Self::NotFound {
            locator: locator.into(),
        }
    }

    /// Creates a stale element error.
    #[inline]
    pub fn stale_element(node: impl Into<String>) -> Self {
        Self::StaleElement { node: node.into() }
    }

    /// Creates an invalid selector error.
    #[inline]
    pub fn invalid_selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a script error.
    #[inline]
    pub fn script_error(message: impl Into<String>) -> Self {
        Self::ScriptError {
            message: message.into(),
        }
    }

    /// Creates a driver error.
    #[inline]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this is a stale element error.
    #[inline]
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleElement { .. })
    }

    /// Returns `true` if this error indicates a transient document state.
    ///
    /// Transient errors raised by a predicate inside a poll loop are
    /// treated as "not yet" and retried until the deadline. All other
    /// errors propagate to the caller immediately.
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::StaleElement { .. })
    }

    /// Returns `true` if this is a caller-misuse error.
    #[inline]
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
