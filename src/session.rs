//! The root session object.
//!
//! A [`Session`] owns the driver handle and the explicit default
//! timeout that every wait in the crate inherits. The timeout is
//! configuration carried by the session and passed down to nested
//! handles, never a hidden module-level global.
//!
//! Sessions are cheap to clone and share their driver. They are not a
//! concurrency primitive: the underlying driver is process-wide
//! mutable state with no built-in mutual exclusion, so concurrent use
//! from multiple tasks must be serialized by the caller (one driver
//! per logical worker).
//!
//! # Example
//!
//! ```ignore
//! let session = Session::new(driver, Duration::from_secs(10))?;
//! session.goto("https://example.com").await?;
//!
//! // `#search` is auto-detected as CSS, `//div` as XPath.
//! session.element("#search").await?.send_keys("hello").await?;
//! let panels = session.elements("//div[@class='panel']").await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::driver::{Cookie, NewWindowKind, ScriptArg, WebDriver};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::expect::Expect;
use crate::locator::classify;
use crate::wait::Wait;

// ============================================================================
// Types
// ============================================================================

struct SessionInner {
    /// The boundary collaborator.
    driver: Arc<dyn WebDriver>,

    /// Default deadline for every wait spawned from this session.
    default_timeout: Mutex<Duration>,
}

// ============================================================================
// Session
// ============================================================================

/// Root handle for driving a browser through the wait layer.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("default_timeout", &*self.inner.default_timeout.lock())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Session - Construction & Configuration
// ============================================================================

impl Session {
    /// Creates a session over a driver with the given default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `default_timeout` is zero.
    pub fn new(driver: Arc<dyn WebDriver>, default_timeout: Duration) -> Result<Self> {
        if default_timeout.is_zero() {
            return Err(Error::invalid_argument(
                "default timeout must be greater than zero",
            ));
        }
        Ok(Self {
            inner: Arc::new(SessionInner {
                driver,
                default_timeout: Mutex::new(default_timeout),
            }),
        })
    }

    /// Returns the underlying driver handle.
    ///
    /// Escape hatch for driver capabilities this layer does not wrap.
    #[inline]
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn WebDriver> {
        &self.inner.driver
    }

    /// Returns the default wait timeout.
    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        *self.inner.default_timeout.lock()
    }

    /// Changes the default wait timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `timeout` is zero.
    pub fn set_default_timeout(&self, timeout: Duration) -> Result<()> {
        if timeout.is_zero() {
            return Err(Error::invalid_argument(
                "default timeout must be greater than zero",
            ));
        }
        *self.inner.default_timeout.lock() = timeout;
        Ok(())
    }

    /// Creates a wait context with the session's default timeout.
    #[must_use]
    pub fn wait(&self) -> Wait {
        Wait::new(Arc::clone(&self.inner.driver), self.default_timeout())
    }

    /// Creates a wait context with an explicit timeout.
    #[must_use]
    pub fn wait_with(&self, timeout: Duration) -> Wait {
        Wait::new(Arc::clone(&self.inner.driver), timeout)
    }

    /// Returns the explicit-wait condition library.
    #[must_use]
    pub fn expect(&self) -> Expect<'_> {
        Expect::new(self)
    }
}

// ============================================================================
// Session - Element Lookup
// ============================================================================

impl Session {
    /// Finds the first element matching an auto-detected selector.
    ///
    /// The selector's dialect is resolved by a live probe (`#content`
    /// classifies as CSS, `//div` as XPath), then the lookup polls
    /// until a match exists or the default timeout expires.
    pub async fn element(&self, selector: &str) -> Result<Element> {
        self.element_within(selector, self.default_timeout()).await
    }

    /// Like [`element`](Self::element), with a deadline for this call
    /// only. The session's default timeout is untouched.
    pub async fn element_within(&self, selector: &str, timeout: Duration) -> Result<Element> {
        let locator = classify(self.inner.driver.as_ref(), selector).await?;
        debug!(locator = %locator, "Looking up element");

        let loc = locator.clone();
        let node = self
            .wait_with(timeout)
            .until(
                move |d| {
                    let loc = loc.clone();
                    Box::pin(async move {
                        d.find_element(loc.strategy, &loc.selector).await.map(Some)
                    })
                },
                format!("could not find element with {locator}"),
            )
            .await?;

        Ok(Element::new(self.clone(), node, locator))
    }

    /// Finds all elements matching an auto-detected selector.
    ///
    /// Waits until at least one match exists; returns an empty vector
    /// if none appear within the timeout.
    pub async fn elements(&self, selector: &str) -> Result<Vec<Element>> {
        self.elements_within(selector, self.default_timeout()).await
    }

    /// Like [`elements`](Self::elements), with a deadline for this
    /// call only.
    pub async fn elements_within(&self, selector: &str, timeout: Duration) -> Result<Vec<Element>> {
        let locator = classify(self.inner.driver.as_ref(), selector).await?;
        debug!(locator = %locator, "Looking up elements");

        let loc = locator.clone();
        let found = self
            .wait_with(timeout)
            .until(
                move |d| {
                    let loc = loc.clone();
                    Box::pin(async move {
                        let nodes = d.find_elements(loc.strategy, &loc.selector).await?;
                        Ok(if nodes.is_empty() { None } else { Some(nodes) })
                    })
                },
                format!("could not find elements with {locator}"),
            )
            .await;

        match found {
            Ok(nodes) => Ok(nodes
                .into_iter()
                .map(|node| Element::new(self.clone(), node, locator.clone()))
                .collect()),
            Err(err) if err.is_timeout() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }
}

// ============================================================================
// Session - Navigation & Document State
// ============================================================================

impl Session {
    /// Navigates to a URL.
    pub async fn goto(&self, url: &str) -> Result<()> {
        debug!(url, "Navigating");
        self.inner.driver.goto(url).await
    }

    /// Navigates with credentials embedded for basic URL authentication.
    ///
    /// The URL must include its scheme (e.g. `https://`).
    pub async fn basic_auth(&self, url: &str, username: &str, password: &str) -> Result<()> {
        let authed = url.replacen("//", &format!("//{username}:{password}@"), 1);
        self.goto(&authed).await
    }

    /// Goes back in browser history.
    pub async fn back(&self) -> Result<()> {
        self.inner.driver.back().await
    }

    /// Goes forward in browser history.
    pub async fn forward(&self) -> Result<()> {
        self.inner.driver.forward().await
    }

    /// Reloads the current page.
    pub async fn refresh(&self) -> Result<()> {
        self.inner.driver.refresh().await
    }

    /// Returns the current document URL.
    pub async fn url(&self) -> Result<String> {
        self.inner.driver.current_url().await
    }

    /// Returns the current document title.
    pub async fn title(&self) -> Result<String> {
        self.inner.driver.title().await
    }

    /// Returns the full HTML source of the current page.
    pub async fn page_source(&self) -> Result<String> {
        self.inner.driver.page_source().await
    }

    /// Returns the browser's user agent string.
    pub async fn user_agent(&self) -> Result<String> {
        let value = self
            .execute_script("return navigator.userAgent;", vec![])
            .await?;
        match value {
            Value::String(agent) => Ok(agent),
            other => Err(Error::script_error(format!(
                "expected user agent string, got {other}"
            ))),
        }
    }

    /// Executes JavaScript in the page context.
    pub async fn execute_script(&self, script: &str, args: Vec<ScriptArg>) -> Result<Value> {
        debug!(script_len = script.len(), "Executing script");
        self.inner.driver.execute_script(script, args).await
    }
}

// ============================================================================
// Session - Scrolling
// ============================================================================

impl Session {
    /// Scrolls the page by an amount in the x and y directions.
    ///
    /// Negative values scroll left and up.
    pub async fn scroll_amount(&self, x: i64, y: i64) -> Result<()> {
        self.inner.driver.scroll_by(x, y).await
    }

    /// Scrolls the page to the bottom.
    pub async fn scroll_to_page_bottom(&self) -> Result<()> {
        self.execute_script("window.scrollTo(0, document.body.scrollHeight)", vec![])
            .await?;
        Ok(())
    }
}

// ============================================================================
// Session - Windows
// ============================================================================

impl Session {
    /// Returns all window handles.
    pub async fn window_handles(&self) -> Result<Vec<String>> {
        self.inner.driver.window_handles().await
    }

    /// Returns the focused window's handle.
    pub async fn current_window_handle(&self) -> Result<String> {
        self.inner.driver.current_window_handle().await
    }

    /// Switches focus to the window with the given handle name.
    pub async fn switch_window(&self, handle: &str) -> Result<()> {
        debug!(handle, "Switching window");
        self.inner.driver.switch_to_window(handle).await
    }

    /// Switches focus to the window at the given index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `index` is out of range.
    pub async fn switch_window_index(&self, index: usize) -> Result<()> {
        let handles = self.window_handles().await?;
        let handle = handles.get(index).ok_or_else(|| {
            Error::invalid_argument(format!(
                "window index {index} out of range ({} windows open)",
                handles.len()
            ))
        })?;
        debug!(index, handle, "Switching window by index");
        self.inner.driver.switch_to_window(handle).await
    }

    /// Opens a new browser window and waits for it to register.
    pub async fn new_window(&self) -> Result<()> {
        self.open_window(NewWindowKind::Window).await
    }

    /// Opens a new browser tab and waits for it to register.
    pub async fn new_tab(&self) -> Result<()> {
        self.open_window(NewWindowKind::Tab).await
    }

    async fn open_window(&self, kind: NewWindowKind) -> Result<()> {
        let expected = self.window_handles().await?.len() + 1;
        debug!(?kind, expected, "Opening new browsing context");
        self.inner.driver.new_window(kind).await?;
        self.wait()
            .until(
                move |d| {
                    Box::pin(async move {
                        Ok((d.window_handles().await?.len() == expected).then_some(()))
                    })
                },
                format!("number of windows did not become {expected}"),
            )
            .await
    }
}

// ============================================================================
// Session - Frames
// ============================================================================

impl Session {
    /// Switches future commands into the frame matched by an
    /// auto-detected selector, waiting for it to become available.
    ///
    /// # Example
    ///
    /// ```ignore
    /// session.switch_frame("iframe[id=ifr]").await?;
    /// ```
    pub async fn switch_frame(&self, selector: &str) -> Result<()> {
        let locator = classify(self.inner.driver.as_ref(), selector).await?;
        debug!(locator = %locator, "Switching frame");

        let loc = locator.clone();
        self.wait()
            .until(
                move |d| {
                    let loc = loc.clone();
                    Box::pin(async move {
                        let node = d.find_element(loc.strategy, &loc.selector).await?;
                        d.switch_to_frame(&node).await.map(Some)
                    })
                },
                format!("frame {locator} is not available"),
            )
            .await
    }

    /// Switches to the parent frame of the current frame.
    pub async fn parent_frame(&self) -> Result<()> {
        self.inner.driver.switch_to_parent_frame().await
    }

    /// Exits all frames and switches to the top-level document.
    pub async fn leave_frame(&self) -> Result<()> {
        self.inner.driver.switch_to_default_content().await
    }
}

// ============================================================================
// Session - Cookies
// ============================================================================

impl Session {
    /// Returns all cookies of the current session.
    pub async fn cookies(&self) -> Result<Vec<Cookie>> {
        self.inner.driver.cookies().await
    }

    /// Adds a cookie to the current session.
    pub async fn add_cookie(&self, cookie: Cookie) -> Result<()> {
        self.inner.driver.add_cookie(cookie).await
    }

    /// Deletes a cookie by name.
    pub async fn delete_cookie(&self, name: &str) -> Result<()> {
        self.inner.driver.delete_cookie(name).await
    }

    /// Deletes all cookies for the current session.
    pub async fn delete_all_cookies(&self) -> Result<()> {
        self.inner.driver.delete_all_cookies().await
    }
}

// ============================================================================
// Tests
// ============================================================================
