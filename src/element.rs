//! Element handles: chainable wrappers around located DOM nodes.
//!
//! An [`Element`] pairs the [`NodeRef`] the driver handed back with the
//! [`Locator`] that found it. The wrapped reference may go stale at any
//! time due to page mutation outside this crate's control; the handle
//! does not self-heal. Detect staleness with a fresh lookup or with
//! [`element_staleness`](crate::expect::Expect::element_staleness).
//!
//! Actions return `&Self` on success so calls chain; any failure
//! (stale node, not interactable) propagates as an error, never
//! silently absorbed, and is never retried at this layer.
//!
//! # Example
//!
//! ```ignore
//! let form = session.element("#login-form").await?;
//! form.element("input[name='user']")
//!     .await?
//!     .clear()
//!     .await?
//!     .send_keys("admin")
//!     .await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::debug;

use crate::driver::{NodeRef, ScriptArg, WebDriver};
use crate::error::{Error, Result};
use crate::locator::{Locator, classify};
use crate::session::Session;

// ============================================================================
// Scripts
// ============================================================================

/// Scripted drag-and-drop fallback.
///
/// Dispatches the page's own drag event sequence directly. Exists
/// because the native pointer simulation is unreliable against some
/// rendering engines and HTML5 drag implementations; callers opt in
/// via [`Element::drag_to_scripted`].
const SIMULATED_DRAG_SCRIPT: &str = r#"
const source = arguments[0];
const target = arguments[1];
const dataTransfer = new DataTransfer();
const rect = target.getBoundingClientRect();
const opts = {
  bubbles: true,
  cancelable: true,
  clientX: rect.x + rect.width / 2,
  clientY: rect.y + rect.height / 2,
  dataTransfer,
};
source.dispatchEvent(new DragEvent('dragstart', opts));
target.dispatchEvent(new DragEvent('dragenter', opts));
target.dispatchEvent(new DragEvent('dragover', opts));
target.dispatchEvent(new DragEvent('drop', opts));
source.dispatchEvent(new DragEvent('dragend', opts));
"#;

/// Selects an `<option>` by internal index and fires `change`.
const SELECT_BY_INDEX_SCRIPT: &str = r#"
const select = arguments[0];
const index = arguments[1];
if (!select.options || index >= select.options.length) return false;
select.selectedIndex = index;
select.dispatchEvent(new Event('change', { bubbles: true }));
return true;
"#;

/// Selects an `<option>` by its `value` attribute and fires `change`.
const SELECT_BY_VALUE_SCRIPT: &str = r#"
const select = arguments[0];
const value = arguments[1];
const option = Array.from(select.options || []).find((o) => o.value === value);
if (!option) return false;
option.selected = true;
select.dispatchEvent(new Event('change', { bubbles: true }));
return true;
"#;

/// Selects an `<option>` by its visible text and fires `change`.
const SELECT_BY_TEXT_SCRIPT: &str = r#"
const select = arguments[0];
const text = arguments[1];
const option = Array.from(select.options || []).find((o) => o.text.trim() === text);
if (!option) return false;
option.selected = true;
select.dispatchEvent(new Event('change', { bubbles: true }));
return true;
"#;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for an element handle.
struct ElementInner {
    /// Owning session, carrying the driver and default timeout.
    session: Session,

    /// Driver-issued reference to the located node.
    node: NodeRef,

    /// The resolved locator that found this node.
    locator: Locator,
}

// ============================================================================
// Element
// ============================================================================

/// A handle to a located DOM node.
///
/// Cheap to clone; clones share the same node reference. Nested
/// lookups re-run selector classification and polling scoped to this
/// node's subtree, inheriting the owning session's default timeout
/// unless given a per-call deadline via the `_within` variants.
#[derive(Clone)]
pub struct Element {
    inner: Arc<ElementInner>,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("node", &self.inner.node)
            .field("locator", &self.inner.locator)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Element - Constructor & Accessors
// ============================================================================

impl Element {
    /// Creates an element handle.
    pub(crate) fn new(session: Session, node: NodeRef, locator: Locator) -> Self {
        Self {
            inner: Arc::new(ElementInner {
                session,
                node,
                locator,
            }),
        }
    }

    /// Returns the driver-issued node reference.
    #[inline]
    #[must_use]
    pub fn node(&self) -> &NodeRef {
        &self.inner.node
    }

    /// Returns the locator that found this node.
    #[inline]
    #[must_use]
    pub fn locator(&self) -> &Locator {
        &self.inner.locator
    }

    fn driver(&self) -> &Arc<dyn WebDriver> {
        self.inner.session.driver()
    }
}

// ============================================================================
// Element - State
// ============================================================================

impl Element {
    /// Returns the node's rendered text.
    pub async fn text(&self) -> Result<String> {
        self.driver().text(&self.inner.node).await
    }

    /// Returns the named attribute's value, or `None` if absent.
    pub async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.driver().attribute(&self.inner.node, name).await
    }

    /// Whether the node is rendered with nonzero width and height.
    pub async fn is_displayed(&self) -> Result<bool> {
        self.driver().is_displayed(&self.inner.node).await
    }

    /// Whether the node is enabled.
    pub async fn is_enabled(&self) -> Result<bool> {
        self.driver().is_enabled(&self.inner.node).await
    }

    /// Whether the node is selected/checked.
    pub async fn is_selected(&self) -> Result<bool> {
        self.driver().is_selected(&self.inner.node).await
    }
}

// ============================================================================
// Element - Nested Search
// ============================================================================

impl Element {
    /// Finds the first descendant matching an auto-detected selector.
    ///
    /// Classification and polling both re-run here, scoped to this
    /// node's subtree; the search root is this node, not the document.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let form = session.element("#login-form").await?;
    /// let submit = form.element("button[type='submit']").await?;
    /// ```
    pub async fn element(&self, selector: &str) -> Result<Element> {
        self.element_within(selector, self.inner.session.default_timeout())
            .await
    }

    /// Like [`element`](Self::element), with a deadline for this call
    /// only.
    pub async fn element_within(&self, selector: &str, timeout: Duration) -> Result<Element> {
        let locator = classify(self.driver().as_ref(), selector).await?;
        debug!(
            scope = %self.inner.node,
            locator = %locator,
            "Looking up nested element"
        );

        let scope = self.inner.node.clone();
        let loc = locator.clone();
        let node = self
            .inner
            .session
            .wait_with(timeout)
            .until(
                move |d| {
                    let scope = scope.clone();
                    let loc = loc.clone();
                    Box::pin(async move {
                        d.find_element_in(&scope, loc.strategy, &loc.selector)
                            .await
                            .map(Some)
                    })
                },
                format!(
                    "could not find element with {locator} inside {}",
                    self.inner.locator
                ),
            )
            .await?;

        Ok(Element::new(self.inner.session.clone(), node, locator))
    }

    /// Finds all descendants matching an auto-detected selector.
    ///
    /// Waits until at least one match exists; returns an empty vector
    /// if none appear within the timeout.
    pub async fn elements(&self, selector: &str) -> Result<Vec<Element>> {
        self.elements_within(selector, self.inner.session.default_timeout())
            .await
    }

    /// Like [`elements`](Self::elements), with a deadline for this
    /// call only.
    pub async fn elements_within(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<Element>> {
        let locator = classify(self.driver().as_ref(), selector).await?;
        debug!(
            scope = %self.inner.node,
            locator = %locator,
            "Looking up nested elements"
        );

        let scope = self.inner.node.clone();
        let loc = locator.clone();
        let found = self
            .inner
            .session
            .wait_with(timeout)
            .until(
                move |d| {
                    let scope = scope.clone();
                    let loc = loc.clone();
                    Box::pin(async move {
                        let nodes = d
                            .find_elements_in(&scope, loc.strategy, &loc.selector)
                            .await?;
                        Ok(if nodes.is_empty() { None } else { Some(nodes) })
                    })
                },
                format!(
                    "could not find elements with {locator} inside {}",
                    self.inner.locator
                ),
            )
            .await;

        match found {
            Ok(nodes) => Ok(nodes
                .into_iter()
                .map(|node| Element::new(self.inner.session.clone(), node, locator.clone()))
                .collect()),
            Err(err) if err.is_timeout() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }
}

// ============================================================================
// Element - Actions
// ============================================================================

impl Element {
    /// Clicks the node.
    pub async fn click(&self) -> Result<&Self> {
        debug!(node = %self.inner.node, "Clicking element");
        self.driver().click(&self.inner.node).await?;
        Ok(self)
    }

    /// Types text into the node.
    pub async fn send_keys(&self, text: &str) -> Result<&Self> {
        debug!(node = %self.inner.node, text_len = text.len(), "Sending keys");
        self.driver().send_keys(&self.inner.node, text).await?;
        Ok(self)
    }

    /// Clears the node's value.
    pub async fn clear(&self) -> Result<&Self> {
        debug!(node = %self.inner.node, "Clearing element");
        self.driver().clear(&self.inner.node).await?;
        Ok(self)
    }

    /// Moves the pointer over the node.
    pub async fn hover(&self) -> Result<&Self> {
        debug!(node = %self.inner.node, "Hovering over element");
        self.driver().hover(&self.inner.node).await?;
        Ok(self)
    }

    /// Double-clicks the node.
    pub async fn double_click(&self) -> Result<&Self> {
        debug!(node = %self.inner.node, "Double clicking element");
        self.driver().double_click(&self.inner.node).await?;
        Ok(self)
    }

    /// Right-clicks the node (context menu).
    pub async fn right_click(&self) -> Result<&Self> {
        debug!(node = %self.inner.node, "Right clicking element");
        self.driver().context_click(&self.inner.node).await?;
        Ok(self)
    }

    /// Scrolls the viewport until the node is in view.
    pub async fn scroll_to(&self) -> Result<&Self> {
        debug!(node = %self.inner.node, "Scrolling to element");
        self.driver().scroll_to(&self.inner.node).await?;
        Ok(self)
    }
}

// ============================================================================
// Element - Drag and Drop
// ============================================================================

impl Element {
    /// Drags this node onto `target` with a native pointer sequence.
    ///
    /// Press on the source, move to the target, release.
    pub async fn drag_to(&self, target: &Element) -> Result<&Self> {
        debug!(
            source = %self.inner.node,
            target = %target.inner.node,
            "Dragging element (pointer sequence)"
        );
        let driver = self.driver();
        driver.pointer_down(&self.inner.node).await?;
        driver.pointer_move(&target.inner.node).await?;
        driver.pointer_up().await?;
        Ok(self)
    }

    /// Drags this node onto `target` by injecting the drag event
    /// sequence as a script.
    ///
    /// Use when the native pointer sequence does not register against
    /// the page's event model.
    pub async fn drag_to_scripted(&self, target: &Element) -> Result<&Self> {
        debug!(
            source = %self.inner.node,
            target = %target.inner.node,
            "Dragging element (scripted fallback)"
        );
        self.driver()
            .execute_script(
                SIMULATED_DRAG_SCRIPT,
                vec![
                    ScriptArg::from(&self.inner.node),
                    ScriptArg::from(&target.inner.node),
                ],
            )
            .await?;
        Ok(self)
    }
}

// ============================================================================
// Element - Select Helpers
// ============================================================================

impl Element {
    /// Selects an `<option>` by the `<select>` element's internal index.
    pub async fn select_by_index(&self, index: usize) -> Result<&Self> {
        debug!(node = %self.inner.node, index, "Selecting option by index");
        self.run_select_script(SELECT_BY_INDEX_SCRIPT, json!(index), || {
            format!("no option at index {index}")
        })
        .await
    }

    /// Selects an `<option>` by its `value` attribute.
    pub async fn select_by_value(&self, value: &str) -> Result<&Self> {
        debug!(node = %self.inner.node, value, "Selecting option by value");
        self.run_select_script(SELECT_BY_VALUE_SCRIPT, json!(value), || {
            format!("no option with value `{value}`")
        })
        .await
    }

    /// Selects an `<option>` by its visible text.
    pub async fn select_by_visible_text(&self, text: &str) -> Result<&Self> {
        debug!(node = %self.inner.node, text, "Selecting option by visible text");
        self.run_select_script(SELECT_BY_TEXT_SCRIPT, json!(text), || {
            format!("no option with text `{text}`")
        })
        .await
    }

    async fn run_select_script(
        &self,
        script: &str,
        arg: Value,
        missing: impl FnOnce() -> String,
    ) -> Result<&Self> {
        let result = self
            .driver()
            .execute_script(
                script,
                vec![ScriptArg::from(&self.inner.node), ScriptArg::from(arg)],
            )
            .await?;
        if matches!(result, Value::Bool(true)) {
            Ok(self)
        } else {
            Err(Error::invalid_argument(missing()))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
