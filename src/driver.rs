//! The driver boundary.
//!
//! Everything in this crate sits one level above "the driver": a
//! capability-bearing object that can query the live document, execute
//! JavaScript in the page, and perform navigation, window, frame and
//! pointer operations. The driver owns the wire protocol; this crate
//! owns none of it.
//!
//! Any of these operations may fail with [`Error::NotFound`] or
//! [`Error::StaleElement`] at any time, because the underlying document
//! mutates out-of-band (page loads, DOM re-renders, AJAX). The wait
//! layer in [`crate::wait`] is built around exactly that assumption.
//!
//! A single driver instance is process-wide mutable state with no
//! built-in mutual exclusion. Concurrent use from multiple tasks is
//! unsupported; give each logical worker its own driver.
//!
//! [`Error::NotFound`]: crate::Error::NotFound
//! [`Error::StaleElement`]: crate::Error::StaleElement

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::locator::Strategy;

// ============================================================================
// NodeRef
// ============================================================================

/// Opaque reference to a live DOM node, issued by the driver.
///
/// The referenced node may detach at any time due to page mutation
/// outside this crate's control; a `NodeRef` does not self-heal.
/// Staleness is detected by the driver returning
/// [`Error::StaleElement`](crate::Error::StaleElement) when the
/// reference is next touched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRef(String);

impl NodeRef {
    /// Creates a node reference from a driver-issued identifier.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying identifier.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// ScriptArg
// ============================================================================

/// Argument passed to [`WebDriver::execute_script`].
///
/// Node references are passed as first-class arguments, the way the
/// WebDriver protocol serializes elements into script calls, so that
/// scripted gestures (drag-and-drop fallback, select helpers) can
/// address live nodes directly.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ScriptArg {
    /// Plain JSON value.
    Value(Value),
    /// Live node reference.
    Node(NodeRef),
}

impl From<Value> for ScriptArg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for ScriptArg {
    fn from(s: &str) -> Self {
        Self::Value(Value::String(s.to_string()))
    }
}

impl From<NodeRef> for ScriptArg {
    fn from(node: NodeRef) -> Self {
        Self::Node(node)
    }
}

impl From<&NodeRef> for ScriptArg {
    fn from(node: &NodeRef) -> Self {
        Self::Node(node.clone())
    }
}

// ============================================================================
// Cookie
// ============================================================================

/// A browser cookie, passed through to the driver as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Cookie path, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Cookie domain, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Whether the cookie requires a secure context.
    #[serde(default)]
    pub secure: bool,
    /// Expiry as a Unix timestamp, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

impl Cookie {
    /// Creates a cookie with only name and value set.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            secure: false,
            expiry: None,
        }
    }
}

// ============================================================================
// NewWindowKind
// ============================================================================

/// Kind of browsing context opened by [`WebDriver::new_window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewWindowKind {
    /// A separate top-level window.
    Window,
    /// A tab in the current window.
    Tab,
}

// ============================================================================
// WebDriver Trait
// ============================================================================

/// The boundary collaborator: a live browser-automation driver.
///
/// Implementations map their own failure modes onto this crate's
/// [`Error`](crate::Error) taxonomy. The contracts that matter to the
/// wait layer:
///
/// - [`find_element`](Self::find_element) fails with `NotFound` when
///   nothing matches.
/// - [`find_elements`](Self::find_elements) returns an empty vector,
///   never an error, when nothing matches.
/// - Node operations fail with `StaleElement` when the reference is no
///   longer attached.
/// - [`execute_script`](Self::execute_script) is the channel used both
///   for the CSS/XPath classification probe and for scripted gesture
///   fallbacks.
#[async_trait]
pub trait WebDriver: Send + Sync {
    // ------------------------------------------------------------------------
    // Document queries
    // ------------------------------------------------------------------------

    /// Finds the first element matching the locator, document-wide.
    async fn find_element(&self, strategy: Strategy, selector: &str) -> Result<NodeRef>;

    /// Finds all elements matching the locator, document-wide.
    ///
    /// Returns an empty vector when nothing matches.
    async fn find_elements(&self, strategy: Strategy, selector: &str) -> Result<Vec<NodeRef>>;

    /// Finds the first element matching the locator inside `scope`'s subtree.
    async fn find_element_in(
        &self,
        scope: &NodeRef,
        strategy: Strategy,
        selector: &str,
    ) -> Result<NodeRef>;

    /// Finds all elements matching the locator inside `scope`'s subtree.
    ///
    /// Returns an empty vector when nothing matches.
    async fn find_elements_in(
        &self,
        scope: &NodeRef,
        strategy: Strategy,
        selector: &str,
    ) -> Result<Vec<NodeRef>>;

    /// Executes JavaScript in the page context.
    ///
    /// The script receives `args` as `arguments[0..n]`; node arguments
    /// arrive as live DOM elements. The script's `return` value comes
    /// back as JSON.
    async fn execute_script(&self, script: &str, args: Vec<ScriptArg>) -> Result<Value>;

    // ------------------------------------------------------------------------
    // Navigation and document state
    // ------------------------------------------------------------------------

    /// Navigates to a URL.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Goes back in browser history.
    async fn back(&self) -> Result<()>;

    /// Goes forward in browser history.
    async fn forward(&self) -> Result<()>;

    /// Reloads the current page.
    async fn refresh(&self) -> Result<()>;

    /// Returns the current document URL.
    async fn current_url(&self) -> Result<String>;

    /// Returns the current document title.
    async fn title(&self) -> Result<String>;

    /// Returns the full HTML source of the current page.
    async fn page_source(&self) -> Result<String>;

    // ------------------------------------------------------------------------
    // Node state
    // ------------------------------------------------------------------------

    /// Returns the node's rendered text.
    async fn text(&self, node: &NodeRef) -> Result<String>;

    /// Returns the named attribute's value, or `None` if absent.
    async fn attribute(&self, node: &NodeRef, name: &str) -> Result<Option<String>>;

    /// Whether the node is rendered with width > 0 and height > 0.
    async fn is_displayed(&self, node: &NodeRef) -> Result<bool>;

    /// Whether the node is enabled (not `disabled`).
    async fn is_enabled(&self, node: &NodeRef) -> Result<bool>;

    /// Whether the node is selected/checked.
    async fn is_selected(&self, node: &NodeRef) -> Result<bool>;

    // ------------------------------------------------------------------------
    // Node actions
    // ------------------------------------------------------------------------

    /// Clicks the node.
    async fn click(&self, node: &NodeRef) -> Result<()>;

    /// Types text into the node.
    async fn send_keys(&self, node: &NodeRef, text: &str) -> Result<()>;

    /// Clears the node's value.
    async fn clear(&self, node: &NodeRef) -> Result<()>;

    // ------------------------------------------------------------------------
    // Pointer gestures
    // ------------------------------------------------------------------------

    /// Moves the pointer over the node (hover).
    async fn hover(&self, node: &NodeRef) -> Result<()>;

    /// Double-clicks the node.
    async fn double_click(&self, node: &NodeRef) -> Result<()>;

    /// Right-clicks the node (context menu).
    async fn context_click(&self, node: &NodeRef) -> Result<()>;

    /// Presses the primary pointer button down on the node.
    async fn pointer_down(&self, node: &NodeRef) -> Result<()>;

    /// Moves the held pointer to the node's center.
    async fn pointer_move(&self, node: &NodeRef) -> Result<()>;

    /// Releases the primary pointer button.
    async fn pointer_up(&self) -> Result<()>;

    /// Scrolls the viewport until the node is in view.
    async fn scroll_to(&self, node: &NodeRef) -> Result<()>;

    /// Scrolls the viewport by a pixel offset.
    async fn scroll_by(&self, x: i64, y: i64) -> Result<()>;

    // ------------------------------------------------------------------------
    // Windows
    // ------------------------------------------------------------------------

    /// Returns all window handles.
    async fn window_handles(&self) -> Result<Vec<String>>;

    /// Returns the focused window's handle.
    async fn current_window_handle(&self) -> Result<String>;

    /// Switches focus to the window with the given handle.
    async fn switch_to_window(&self, handle: &str) -> Result<()>;

    /// Opens a new window or tab and switches focus to it.
    async fn new_window(&self, kind: NewWindowKind) -> Result<()>;

    // ------------------------------------------------------------------------
    // Frames
    // ------------------------------------------------------------------------

    /// Switches future commands into the frame owned by `node`.
    async fn switch_to_frame(&self, node: &NodeRef) -> Result<()>;

    /// Switches to the parent frame of the current frame.
    async fn switch_to_parent_frame(&self) -> Result<()>;

    /// Exits all frames back to the top-level document.
    async fn switch_to_default_content(&self) -> Result<()>;

    // ------------------------------------------------------------------------
    // Cookies
    // ------------------------------------------------------------------------

    /// Returns all cookies for the current session.
    async fn cookies(&self) -> Result<Vec<Cookie>>;

    /// Adds a cookie to the current session.
    async fn add_cookie(&self, cookie: Cookie) -> Result<()>;

    /// Deletes a cookie by name.
    async fn delete_cookie(&self, name: &str) -> Result<()>;

    /// Deletes all cookies for the current session.
    async fn delete_all_cookies(&self) -> Result<()>;
}

// ============================================================================
// Tests
// ============================================================================
