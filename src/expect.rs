//! The explicit-wait condition library.
//!
//! [`Expect`] is a catalog of named conditions built from selector
//! classification plus the driver's query primitives, each run through
//! the poll-until engine in [`crate::wait`]. Every condition fails
//! with [`Error::Timeout`](crate::Error::Timeout) carrying a message
//! that names the locator and the expected value; no condition ever
//! swallows its outcome into a silent boolean.
//!
//! A condition succeeding gives no atomicity: between success and the
//! caller acting on it, the document may already have changed again.
//! Treat every handle as provisionally valid and re-query after any
//! navigation or anticipated DOM replacement.
//!
//! # Example
//!
//! ```ignore
//! session.expect().element_visibility("#results").await?;
//! session.expect().url_to_include("/dashboard").await?;
//! session.expect().element_invisibility(&spinner).await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tracing::debug;

use crate::element::Element;
use crate::error::Result;
use crate::locator::{Locator, Target, classify};
use crate::session::Session;
use crate::wait::Wait;

// ============================================================================
// Expect
// ============================================================================

/// Explicit-wait conditions, scoped to a session.
///
/// Obtained via [`Session::expect`]; every condition polls with the
/// session's default timeout unless [`within`](Self::within) overrides
/// it for this instance.
pub struct Expect<'s> {
    session: &'s Session,
    timeout: Option<Duration>,
}

impl<'s> Expect<'s> {
    pub(crate) fn new(session: &'s Session) -> Self {
        Self {
            session,
            timeout: None,
        }
    }

    /// Overrides the deadline for conditions run through this instance.
    ///
    /// # Example
    ///
    /// ```ignore
    /// session
    ///     .expect()
    ///     .within(Duration::from_secs(30))
    ///     .element_visibility("#report")
    ///     .await?;
    /// ```
    #[must_use]
    pub fn within(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn wait(&self) -> Wait {
        match self.timeout {
            Some(timeout) => self.session.wait_with(timeout),
            None => self.session.wait(),
        }
    }

    async fn locator_for(&self, selector: &str) -> Result<Locator> {
        classify(self.session.driver().as_ref(), selector).await
    }
}

// ============================================================================
// Expect - Presence & Visibility
// ============================================================================

impl Expect<'_> {
    /// Waits until at least one element matching the selector is on
    /// the DOM. No visibility check.
    pub async fn element_presence(&self, selector: &str) -> Result<()> {
        let locator = self.locator_for(selector).await?;
        debug!(locator = %locator, "Waiting for element presence");

        let loc = locator.clone();
        self.wait()
            .until(
                move |d| {
                    let loc = loc.clone();
                    Box::pin(async move {
                        d.find_element(loc.strategy, &loc.selector)
                            .await
                            .map(|_| Some(()))
                    })
                },
                format!("element {locator} is not present on the DOM"),
            )
            .await
    }

    /// Waits until an element matching the selector is on the DOM and
    /// visible: rendered with width and height greater than zero.
    pub async fn element_visibility(&self, selector: &str) -> Result<()> {
        let locator = self.locator_for(selector).await?;
        debug!(locator = %locator, "Waiting for element visibility");

        let loc = locator.clone();
        self.wait()
            .until(
                move |d| {
                    let loc = loc.clone();
                    Box::pin(async move {
                        let node = d.find_element(loc.strategy, &loc.selector).await?;
                        Ok(d.is_displayed(&node).await?.then_some(()))
                    })
                },
                format!("element {locator} is not visible"),
            )
            .await
    }

    /// Waits until **all** elements matching the selector are visible.
    ///
    /// A single non-visible node among many keeps polling. Succeeds
    /// only when at least one node matches and every matched node is
    /// visible at the moment of the successful poll.
    pub async fn elements_visibility(&self, selector: &str) -> Result<()> {
        let locator = self.locator_for(selector).await?;
        debug!(locator = %locator, "Waiting for visibility of all elements");

        let loc = locator.clone();
        self.wait()
            .until(
                move |d| {
                    let loc = loc.clone();
                    Box::pin(async move {
                        let nodes = d.find_elements(loc.strategy, &loc.selector).await?;
                        if nodes.is_empty() {
                            return Ok(None);
                        }
                        for node in &nodes {
                            if !d.is_displayed(node).await? {
                                return Ok(None);
                            }
                        }
                        Ok(Some(()))
                    })
                },
                format!("not all elements {locator} are visible"),
            )
            .await
    }
}

// ============================================================================
// Expect - Invisibility & Staleness
// ============================================================================

impl Expect<'_> {
    /// Waits until the target is either invisible or absent from the DOM.
    ///
    /// Accepts a selector or an existing [`Element`]. A handle whose
    /// node has gone stale counts as invisible.
    pub async fn element_invisibility(&self, target: impl Into<Target>) -> Result<()> {
        match target.into() {
            Target::Selector(selector) => {
                let locator = self.locator_for(&selector).await?;
                debug!(locator = %locator, "Waiting for element invisibility");

                let loc = locator.clone();
                self.wait()
                    .until(
                        move |d| {
                            let loc = loc.clone();
                            Box::pin(async move {
                                let node = match d.find_element(loc.strategy, &loc.selector).await {
                                    Ok(node) => node,
                                    // Absent from the DOM counts as invisible.
                                    Err(err) if err.is_transient() => return Ok(Some(())),
                                    Err(err) => return Err(err),
                                };
                                match d.is_displayed(&node).await {
                                    Ok(displayed) => Ok((!displayed).then_some(())),
                                    Err(err) if err.is_transient() => Ok(Some(())),
                                    Err(err) => Err(err),
                                }
                            })
                        },
                        format!("element {locator} is not invisible"),
                    )
                    .await
            }
            Target::Handle(element) => {
                let locator = element.locator().clone();
                debug!(locator = %locator, node = %element.node(), "Waiting for handle invisibility");

                let node = element.node().clone();
                self.wait()
                    .until(
                        move |d| {
                            let node = node.clone();
                            Box::pin(async move {
                                match d.is_displayed(&node).await {
                                    Ok(displayed) => Ok((!displayed).then_some(())),
                                    Err(err) if err.is_transient() => Ok(Some(())),
                                    Err(err) => Err(err),
                                }
                            })
                        },
                        format!("element {locator} is not invisible"),
                    )
                    .await
            }
        }
    }

    /// Waits until elements matching the selector exist and none of
    /// them are visible.
    ///
    /// Zero matches is "not yet", just like a still-visible match: the
    /// condition demands at least one hidden element. For a target that
    /// may be absent entirely, use
    /// [`element_invisibility`](Self::element_invisibility).
    ///
    /// Best-effort against a mutating document: a node vanishing
    /// mid-check is treated as "not yet" and retried, never surfaced.
    pub async fn elements_invisibility(&self, selector: &str) -> Result<()> {
        let locator = self.locator_for(selector).await?;
        debug!(locator = %locator, "Waiting for invisibility of all elements");

        let loc = locator.clone();
        self.wait()
            .until(
                move |d| {
                    let loc = loc.clone();
                    Box::pin(async move {
                        let nodes = match d.find_elements(loc.strategy, &loc.selector).await {
                            Ok(nodes) => nodes,
                            Err(err) if err.is_transient() => return Ok(None),
                            Err(err) => return Err(err),
                        };
                        if nodes.is_empty() {
                            return Ok(None);
                        }
                        for node in &nodes {
                            match d.is_displayed(node).await {
                                Ok(true) => return Ok(None),
                                Ok(false) => {}
                                // Vanished between find and check.
                                Err(err) if err.is_transient() => return Ok(None),
                                Err(err) => return Err(err),
                            }
                        }
                        Ok(Some(()))
                    })
                },
                format!("elements {locator} are not invisible"),
            )
            .await
    }

    /// Waits until the element's node reference is no longer attached
    /// to the DOM.
    ///
    /// Keyed to the originally-held node: succeeds once touching that
    /// reference reports detached, even if a different node now matches
    /// the same locator.
    pub async fn element_staleness(&self, element: &Element) -> Result<()> {
        let locator = element.locator().clone();
        debug!(locator = %locator, node = %element.node(), "Waiting for element staleness");

        let node = element.node().clone();
        self.wait()
            .until(
                move |d| {
                    let node = node.clone();
                    Box::pin(async move {
                        // Any touch will do; a live node answers, a
                        // detached one errors.
                        match d.is_enabled(&node).await {
                            Ok(_) => Ok(None),
                            Err(err) if err.is_transient() => Ok(Some(())),
                            Err(err) => Err(err),
                        }
                    })
                },
                format!("element {locator} did not go stale"),
            )
            .await
    }
}

// ============================================================================
// Expect - Interactability
// ============================================================================

impl Expect<'_> {
    /// Waits until the target is present, visible and enabled, such
    /// that it can be clicked.
    ///
    /// Accepts a selector or an existing [`Element`].
    pub async fn element_clickable(&self, target: impl Into<Target>) -> Result<()> {
        let (locator, node) = match target.into() {
            Target::Selector(selector) => (self.locator_for(&selector).await?, None),
            Target::Handle(element) => (element.locator().clone(), Some(element.node().clone())),
        };
        debug!(locator = %locator, "Waiting for element to be clickable");

        let loc = locator.clone();
        self.wait()
            .until(
                move |d| {
                    let loc = loc.clone();
                    let node = node.clone();
                    Box::pin(async move {
                        let node = match node {
                            Some(node) => node,
                            None => d.find_element(loc.strategy, &loc.selector).await?,
                        };
                        let clickable =
                            d.is_displayed(&node).await? && d.is_enabled(&node).await?;
                        Ok(clickable.then_some(()))
                    })
                },
                format!("element {locator} is not clickable"),
            )
            .await
    }

    /// Waits until the element's boolean selection state equals
    /// `selected` (checkboxes, radio buttons, options).
    pub async fn element_selection_state(&self, selector: &str, selected: bool) -> Result<()> {
        let locator = self.locator_for(selector).await?;
        debug!(locator = %locator, selected, "Waiting for selection state");

        let loc = locator.clone();
        let message = if selected {
            format!("element {locator} is not selected")
        } else {
            format!("element {locator} is selected")
        };
        self.wait()
            .until(
                move |d| {
                    let loc = loc.clone();
                    Box::pin(async move {
                        let node = d.find_element(loc.strategy, &loc.selector).await?;
                        Ok((d.is_selected(&node).await? == selected).then_some(()))
                    })
                },
                message,
            )
            .await
    }
}

// ============================================================================
// Expect - Text & Attributes
// ============================================================================

impl Expect<'_> {
    /// Waits until the element's rendered text is non-empty.
    pub async fn element_text(&self, selector: &str) -> Result<()> {
        let locator = self.locator_for(selector).await?;
        debug!(locator = %locator, "Waiting for element text");

        let loc = locator.clone();
        self.wait()
            .until(
                move |d| {
                    let loc = loc.clone();
                    Box::pin(async move {
                        let node = d.find_element(loc.strategy, &loc.selector).await?;
                        let text = d.text(&node).await?;
                        Ok((!text.is_empty()).then_some(()))
                    })
                },
                format!("no text in element {locator}"),
            )
            .await
    }

    /// Waits until the element's rendered text exactly equals `text`.
    ///
    /// Case-sensitive, byte-exact comparison.
    pub async fn element_text_to_be(&self, selector: &str, text: &str) -> Result<()> {
        let locator = self.locator_for(selector).await?;
        debug!(locator = %locator, expected = text, "Waiting for exact element text");

        let loc = locator.clone();
        let expected = text.to_string();
        self.wait()
            .until(
                move |d| {
                    let loc = loc.clone();
                    let expected = expected.clone();
                    Box::pin(async move {
                        let node = d.find_element(loc.strategy, &loc.selector).await?;
                        Ok((d.text(&node).await? == expected).then_some(()))
                    })
                },
                format!("element {locator} text is not `{text}`"),
            )
            .await
    }

    /// Waits until the element's rendered text contains `text`.
    pub async fn element_text_to_include(&self, selector: &str, text: &str) -> Result<()> {
        let locator = self.locator_for(selector).await?;
        debug!(locator = %locator, expected = text, "Waiting for element text to include");

        let loc = locator.clone();
        let expected = text.to_string();
        self.wait()
            .until(
                move |d| {
                    let loc = loc.clone();
                    let expected = expected.clone();
                    Box::pin(async move {
                        let node = d.find_element(loc.strategy, &loc.selector).await?;
                        Ok(d.text(&node).await?.contains(&expected).then_some(()))
                    })
                },
                format!("element {locator} text does not include `{text}`"),
            )
            .await
    }

    /// Waits until the named attribute's value contains `text`.
    ///
    /// An absent attribute keeps polling.
    pub async fn element_attribute_text_to_include(
        &self,
        selector: &str,
        attribute: &str,
        text: &str,
    ) -> Result<()> {
        let locator = self.locator_for(selector).await?;
        debug!(
            locator = %locator,
            attribute,
            expected = text,
            "Waiting for attribute text to include"
        );

        let loc = locator.clone();
        let attribute_name = attribute.to_string();
        let expected = text.to_string();
        self.wait()
            .until(
                move |d| {
                    let loc = loc.clone();
                    let attribute_name = attribute_name.clone();
                    let expected = expected.clone();
                    Box::pin(async move {
                        let node = d.find_element(loc.strategy, &loc.selector).await?;
                        let value = d.attribute(&node, &attribute_name).await?;
                        Ok(value
                            .is_some_and(|v| v.contains(&expected))
                            .then_some(()))
                    })
                },
                format!("`{text}` is not present in attribute `{attribute}` of element {locator}"),
            )
            .await
    }
}

// ============================================================================
// Expect - URL & Title
// ============================================================================

impl Expect<'_> {
    /// Waits until the current URL exactly equals `url`.
    ///
    /// Case-sensitive, byte-exact comparison.
    pub async fn url_to_be(&self, url: &str) -> Result<()> {
        debug!(expected = url, "Waiting for exact url");
        let expected = url.to_string();
        self.wait()
            .until(
                move |d| {
                    let expected = expected.clone();
                    Box::pin(async move { Ok((d.current_url().await? == expected).then_some(())) })
                },
                format!("url is not `{url}`"),
            )
            .await
    }

    /// Waits until the current URL contains the case-sensitive substring.
    pub async fn url_to_include(&self, string: &str) -> Result<()> {
        debug!(expected = string, "Waiting for url to include");
        let expected = string.to_string();
        self.wait()
            .until(
                move |d| {
                    let expected = expected.clone();
                    Box::pin(async move {
                        Ok(d.current_url().await?.contains(&expected).then_some(()))
                    })
                },
                format!("url does not contain `{string}`"),
            )
            .await
    }

    /// Waits until the page title exactly equals `title`.
    pub async fn title_to_be(&self, title: &str) -> Result<()> {
        debug!(expected = title, "Waiting for exact title");
        let expected = title.to_string();
        self.wait()
            .until(
                move |d| {
                    let expected = expected.clone();
                    Box::pin(async move { Ok((d.title().await? == expected).then_some(())) })
                },
                format!("title is not `{title}`"),
            )
            .await
    }

    /// Waits until the page title contains the case-sensitive substring.
    pub async fn title_to_contain(&self, string: &str) -> Result<()> {
        debug!(expected = string, "Waiting for title to contain");
        let expected = string.to_string();
        self.wait()
            .until(
                move |d| {
                    let expected = expected.clone();
                    Box::pin(async move { Ok(d.title().await?.contains(&expected).then_some(())) })
                },
                format!("title does not contain `{string}`"),
            )
            .await
    }
}
