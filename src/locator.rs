//! Locator strategies and selector classification.
//!
//! Callers hand this crate raw selector strings that are semantically
//! ambiguous: `#content` reads as CSS, `//div` reads as XPath, and
//! plenty of strings read as both. [`classify`] resolves the ambiguity
//! with a runtime probe against the live document, not a regex: the
//! selector is tried against `document.createDocumentFragment()
//! .querySelector`, the exact query engine the eventual find will use.
//!
//! # Example
//!
//! ```ignore
//! let locator = classify(driver.as_ref(), "#content").await?;
//! assert_eq!(locator.strategy, Strategy::Css);
//!
//! let locator = classify(driver.as_ref(), "//div").await?;
//! assert_eq!(locator.strategy, Strategy::XPath);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::driver::{ScriptArg, WebDriver};
use crate::element::Element;
use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Probe executed in the page to decide whether a selector is valid CSS.
///
/// Querying a detached fragment exercises the selector parser without
/// touching the page. A syntax error means the string is not CSS.
const CSS_PROBE: &str = r#"
const queryCheck = (s) => document.createDocumentFragment().querySelector(s)

const isSelectorValid = (selector) => {
  try { queryCheck(selector) } catch { return false }
  return true
}

return isSelectorValid(arguments[0])
"#;

// ============================================================================
// Strategy
// ============================================================================

/// Query dialect used against the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// CSS selector.
    #[serde(rename = "css")]
    Css,
    /// XPath expression.
    #[serde(rename = "xpath")]
    XPath,
}

impl Strategy {
    /// Returns the strategy name used in locator descriptions.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::XPath => "xpath",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Locator
// ============================================================================

/// A resolved `(strategy, selector)` pair.
///
/// Once resolved a locator is deterministic: it never mutates, and the
/// same pair always describes the same query. Failure messages quote
/// it via its `Display` impl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    /// Query dialect.
    pub strategy: Strategy,
    /// The raw selector string.
    pub selector: String,
}

impl Locator {
    /// Creates a CSS locator.
    #[inline]
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::Css,
            selector: selector.into(),
        }
    }

    /// Creates an XPath locator.
    #[inline]
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::XPath,
            selector: selector.into(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.strategy, self.selector)
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Resolves an ambiguous selector string into a [`Locator`].
///
/// Runs the CSS probe inside the live page: if the selector parses as
/// CSS the locator is CSS, otherwise it defaults to XPath. A string
/// valid as *neither* dialect is classified as XPath on purpose, so it
/// fails at find-time with a distinguishable
/// [`InvalidSelector`](crate::Error::InvalidSelector) error instead of
/// being silently rewritten.
pub async fn classify(driver: &dyn WebDriver, selector: &str) -> Result<Locator> {
    let verdict = driver
        .execute_script(CSS_PROBE, vec![ScriptArg::from(selector)])
        .await?;
    let is_css = matches!(verdict, Value::Bool(true));

    let locator = if is_css {
        Locator::css(selector)
    } else {
        Locator::xpath(selector)
    };
    debug!(selector = %selector, strategy = %locator.strategy, "Classified selector");
    Ok(locator)
}

// ============================================================================
// Target
// ============================================================================

/// What a condition is aimed at: a raw selector or an existing handle.
///
/// Resolved once at the API boundary. Conditions that accept either
/// form ([`element_clickable`](crate::expect::Expect::element_clickable),
/// [`element_invisibility`](crate::expect::Expect::element_invisibility))
/// take `impl Into<Target>` so both read naturally at the call site:
///
/// ```ignore
/// session.expect().element_clickable("#save").await?;
/// session.expect().element_invisibility(&spinner).await?;
/// ```
#[derive(Debug, Clone)]
pub enum Target {
    /// Raw selector string, classified lazily when the condition runs.
    Selector(String),
    /// An already-located element handle.
    Handle(Element),
}

impl From<&str> for Target {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

impl From<String> for Target {
    fn from(selector: String) -> Self {
        Self::Selector(selector)
    }
}

impl From<Element> for Target {
    fn from(element: Element) -> Self {
        Self::Handle(element)
    }
}

impl From<&Element> for Target {
    fn from(element: &Element) -> Self {
        Self::Handle(element.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
