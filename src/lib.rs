//! webdriver-waits - Explicit-wait convenience layer for browser automation.
//!
//! This library sits one level above a WebDriver-style driver and takes
//! the guesswork out of querying an asynchronously-rendering document:
//! ambiguous selector strings are resolved into deterministic locators
//! by probing the live page, and every lookup or condition is retried
//! against current document state until it holds or a deadline expires.
//!
//! # Architecture
//!
//! Four pieces, leaf-first:
//!
//! - **Classification** ([`locator`]): decides CSS vs XPath by running
//!   the selector through the page's own query engine, not a regex.
//! - **Poll-until engine** ([`wait`]): generic retry loop with a fixed
//!   short interval, swallowing transient stale/not-found errors and
//!   converting deadline expiry into a diagnostic [`Error::Timeout`].
//! - **Condition library** ([`expect`]): presence, visibility,
//!   invisibility, staleness, clickability, text/attribute content,
//!   selection state, URL/title - each with its own truthy contract.
//! - **Element handles** ([`element`]): chainable wrappers around
//!   located nodes that re-apply classification and polling for nested
//!   lookups and expose gestures (hover, drag-and-drop with a scripted
//!   fallback).
//!
//! The driver itself is a boundary collaborator behind the
//! [`WebDriver`] trait; this crate owns no wire protocol, no browser
//! process, and no screenshot or cookie-file I/O.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use webdriver_waits::{Result, Session, WebDriver};
//!
//! async fn run(driver: Arc<dyn WebDriver>) -> Result<()> {
//!     let session = Session::new(driver, Duration::from_secs(10))?;
//!
//!     session.goto("https://example.com").await?;
//!
//!     // `input[name="q"]` classifies as CSS, `//button` as XPath;
//!     // both lookups poll until the element appears.
//!     session.element("input[name=\"q\"]").await?.send_keys("hello").await?;
//!     session.element("//button[@type='submit']").await?.click().await?;
//!
//!     session.expect().url_to_include("/results").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`session`] | Root [`Session`]: driver handle + default timeout |
//! | [`element`] | [`Element`] handles with gestures and nested lookup |
//! | [`expect`] | [`Expect`] condition library |
//! | [`wait`] | [`Wait`] poll-until engine |
//! | [`locator`] | [`Strategy`], [`Locator`], selector classification |
//! | [`driver`] | [`WebDriver`] boundary trait and wire-level types |
//! | [`error`] | Error types and [`Result`] alias |
//!
//! # Concurrency
//!
//! Polling is cooperative and caller-blocking: no operation spawns
//! workers, and the only suspension point is the sleep between poll
//! iterations. A driver instance is process-wide mutable state with no
//! built-in mutual exclusion; give each logical worker its own.

// ============================================================================
// Modules
// ============================================================================

/// The [`WebDriver`] boundary trait plus [`NodeRef`], [`ScriptArg`],
/// [`Cookie`] and [`NewWindowKind`].
pub mod driver;

/// Element handles with chainable actions and nested scoped lookup.
pub mod element;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// The explicit-wait condition library.
pub mod expect;

/// Locator strategies and live-probe selector classification.
pub mod locator;

/// The root session object.
pub mod session;

/// The poll-until engine.
pub mod wait;

// ============================================================================
// Re-exports
// ============================================================================

// Driver boundary
pub use driver::{Cookie, NewWindowKind, NodeRef, ScriptArg, WebDriver};

// Core types
pub use element::Element;
pub use expect::Expect;
pub use session::Session;
pub use wait::{DEFAULT_POLL_INTERVAL, Wait};

// Locators
pub use locator::{Locator, Strategy, Target, classify};

// Error types
pub use error::{Error, Result};
