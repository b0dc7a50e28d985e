//! Scriptable in-memory driver for exercising the wait layer.
//!
//! Models just enough of a document to script the interesting
//! behaviors: nodes that appear after a few lookups, turn visible
//! after a few checks, vanish mid-poll, or go stale while a new node
//! takes over their locator.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use webdriver_waits::{
    Cookie, Error, NewWindowKind, NodeRef, Result, ScriptArg, Strategy, WebDriver,
};

// ============================================================================
// FakeNode
// ============================================================================

/// One scripted node in the fake document.
#[derive(Clone)]
pub struct FakeNode {
    id: String,
    parent: Option<String>,
    selectors: Vec<(Strategy, String)>,
    text: String,
    attrs: HashMap<String, String>,
    displayed: bool,
    enabled: bool,
    selected: bool,
    checkbox: bool,
    /// Find calls that miss this node before it "appears".
    appears_after: u32,
    /// Visibility checks that report hidden before `displayed` applies.
    displayed_after: u32,
    /// Enabled checks that report disabled before `enabled` applies.
    enabled_after: u32,
    /// While > 0 the node shows up in find results but every node
    /// operation reports stale; at 0 it is gone from the document.
    vanishing: Option<u32>,
}

impl FakeNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent: None,
            selectors: Vec::new(),
            text: String::new(),
            attrs: HashMap::new(),
            displayed: true,
            enabled: true,
            selected: false,
            checkbox: false,
            appears_after: 0,
            displayed_after: 0,
            enabled_after: 0,
            vanishing: None,
        }
    }

    pub fn css(mut self, selector: &str) -> Self {
        self.selectors.push((Strategy::Css, selector.to_string()));
        self
    }

    pub fn xpath(mut self, selector: &str) -> Self {
        self.selectors.push((Strategy::XPath, selector.to_string()));
        self
    }

    pub fn parent(mut self, id: &str) -> Self {
        self.parent = Some(id.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    pub fn checkbox(mut self) -> Self {
        self.checkbox = true;
        self
    }

    pub fn appears_after(mut self, finds: u32) -> Self {
        self.appears_after = finds;
        self
    }

    pub fn displayed_after(mut self, checks: u32) -> Self {
        self.displayed_after = checks;
        self
    }

    pub fn enabled_after(mut self, checks: u32) -> Self {
        self.enabled_after = checks;
        self
    }

    pub fn vanishing(mut self, finds: u32) -> Self {
        self.vanishing = Some(finds);
        self
    }
}

// ============================================================================
// State
// ============================================================================

#[derive(Default)]
struct State {
    url: String,
    title: String,
    history: Vec<String>,
    history_pos: usize,
    css_valid: HashSet<String>,
    invalid_xpath: HashSet<String>,
    nodes: Vec<FakeNode>,
    stale: HashSet<String>,
    window_handles: Vec<String>,
    focused_window: usize,
    frame_stack: Vec<String>,
    cookies: Vec<Cookie>,
    user_agent: Value,
    drop_text: String,
    held: Option<String>,
    held_over: Option<String>,
    pointer_log: Vec<String>,
    typed: Vec<(String, String)>,
    find_calls: u64,
    url_reads: u64,
}

impl State {
    fn node(&self, id: &str) -> Option<&FakeNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut FakeNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Access a node for an operation, honoring staleness.
    fn live_node_mut(&mut self, id: &str) -> Result<&mut FakeNode> {
        if self.stale.contains(id) {
            return Err(Error::stale_element(id));
        }
        match self.nodes.iter().position(|n| n.id == id) {
            Some(pos) if self.nodes[pos].vanishing.is_none() => Ok(&mut self.nodes[pos]),
            _ => Err(Error::stale_element(id)),
        }
    }

    fn in_scope(&self, node_id: &str, scope: &str) -> bool {
        let mut current = self.node(node_id).and_then(|n| n.parent.clone());
        while let Some(parent) = current {
            if parent == scope {
                return true;
            }
            current = self.node(&parent).and_then(|n| n.parent.clone());
        }
        false
    }

    fn find(
        &mut self,
        scope: Option<&str>,
        strategy: Strategy,
        selector: &str,
    ) -> Result<Vec<NodeRef>> {
        self.find_calls += 1;
        if strategy == Strategy::XPath && self.invalid_xpath.contains(selector) {
            return Err(Error::invalid_selector(
                selector,
                "is not a valid XPath expression",
            ));
        }

        let stale = self.stale.clone();
        let scoped: Vec<String> = self
            .nodes
            .iter()
            .filter(|n| {
                n.selectors
                    .iter()
                    .any(|(s, sel)| *s == strategy && sel == selector)
            })
            .map(|n| n.id.clone())
            .collect();

        let mut out = Vec::new();
        for id in scoped {
            if stale.contains(&id) {
                continue;
            }
            if let Some(scope) = scope {
                if !self.in_scope(&id, scope) {
                    continue;
                }
            }
            let node = self.node_mut(&id).expect("node exists");
            if node.appears_after > 0 {
                node.appears_after -= 1;
                continue;
            }
            match node.vanishing {
                Some(0) => continue,
                Some(n) => {
                    node.vanishing = Some(n - 1);
                }
                None => {}
            }
            out.push(NodeRef::new(&node.id));
        }
        Ok(out)
    }

    fn drop_onto(&mut self, target: &str) {
        let text = self.drop_text.clone();
        if let Some(node) = self.node_mut(target) {
            node.text = text;
        }
    }

    fn options_of(&self, select_id: &str) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| n.parent.as_deref() == Some(select_id))
            .map(|n| n.id.clone())
            .collect()
    }

    fn choose_option(&mut self, select_id: &str, chosen: &str) {
        let options = self.options_of(select_id);
        for id in options {
            let selected = id == chosen;
            if let Some(node) = self.node_mut(&id) {
                node.selected = selected;
            }
        }
    }
}

// ============================================================================
// FakeDriver
// ============================================================================

#[derive(Clone)]
pub struct FakeDriver {
    state: Arc<Mutex<State>>,
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs a test-writer subscriber once per process.
///
/// Honors `RUST_LOG`, e.g. `RUST_LOG=webdriver_waits=trace`.
fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

impl FakeDriver {
    pub fn new() -> Self {
        init_tracing();
        let state = State {
            url: "about:blank".to_string(),
            user_agent: Value::String("FakeDriver/1.0".to_string()),
            drop_text: "Dropped!".to_string(),
            window_handles: vec!["w0".to_string()],
            ..State::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn into_arc(self) -> Arc<dyn WebDriver> {
        Arc::new(self)
    }

    // ------------------------------------------------------------------------
    // Scripting the document
    // ------------------------------------------------------------------------

    pub fn css_valid(&self, selector: &str) {
        self.state.lock().css_valid.insert(selector.to_string());
    }

    pub fn xpath_invalid(&self, selector: &str) {
        self.state
            .lock()
            .invalid_xpath
            .insert(selector.to_string());
    }

    pub fn add_node(&self, node: FakeNode) {
        self.state.lock().nodes.push(node);
    }

    pub fn set_url(&self, url: &str) {
        self.state.lock().url = url.to_string();
    }

    pub fn set_title(&self, title: &str) {
        self.state.lock().title = title.to_string();
    }

    pub fn set_user_agent(&self, value: Value) {
        self.state.lock().user_agent = value;
    }

    pub fn make_stale(&self, id: &str) {
        self.state.lock().stale.insert(id.to_string());
    }

    pub fn set_displayed(&self, id: &str, displayed: bool) {
        let mut state = self.state.lock();
        if let Some(node) = state.node_mut(id) {
            node.displayed = displayed;
        }
    }

    pub fn set_node_text(&self, id: &str, text: &str) {
        let mut state = self.state.lock();
        if let Some(node) = state.node_mut(id) {
            node.text = text.to_string();
        }
    }

    // ------------------------------------------------------------------------
    // Observing what happened
    // ------------------------------------------------------------------------

    pub fn node_text(&self, id: &str) -> String {
        self.state
            .lock()
            .node(id)
            .map(|n| n.text.clone())
            .unwrap_or_default()
    }

    pub fn node_selected(&self, id: &str) -> bool {
        self.state.lock().node(id).is_some_and(|n| n.selected)
    }

    pub fn pointer_log(&self) -> Vec<String> {
        self.state.lock().pointer_log.clone()
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.state.lock().typed.clone()
    }

    pub fn find_calls(&self) -> u64 {
        self.state.lock().find_calls
    }

    pub fn url_reads(&self) -> u64 {
        self.state.lock().url_reads
    }

    pub fn frame_stack(&self) -> Vec<String> {
        self.state.lock().frame_stack.clone()
    }

    pub fn focused_window(&self) -> String {
        let state = self.state.lock();
        state.window_handles[state.focused_window].clone()
    }

    pub fn cookie_names(&self) -> Vec<String> {
        self.state
            .lock()
            .cookies
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }
}

// ============================================================================
// WebDriver impl
// ============================================================================

#[async_trait]
impl WebDriver for FakeDriver {
    async fn find_element(&self, strategy: Strategy, selector: &str) -> Result<NodeRef> {
        let mut state = self.state.lock();
        state
            .find(None, strategy, selector)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("{strategy} `{selector}`")))
    }

    async fn find_elements(&self, strategy: Strategy, selector: &str) -> Result<Vec<NodeRef>> {
        self.state.lock().find(None, strategy, selector)
    }

    async fn find_element_in(
        &self,
        scope: &NodeRef,
        strategy: Strategy,
        selector: &str,
    ) -> Result<NodeRef> {
        let mut state = self.state.lock();
        if state.stale.contains(scope.as_str()) {
            return Err(Error::stale_element(scope.as_str()));
        }
        state
            .find(Some(scope.as_str()), strategy, selector)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("{strategy} `{selector}`")))
    }

    async fn find_elements_in(
        &self,
        scope: &NodeRef,
        strategy: Strategy,
        selector: &str,
    ) -> Result<Vec<NodeRef>> {
        let mut state = self.state.lock();
        if state.stale.contains(scope.as_str()) {
            return Err(Error::stale_element(scope.as_str()));
        }
        state.find(Some(scope.as_str()), strategy, selector)
    }

    async fn execute_script(&self, script: &str, args: Vec<ScriptArg>) -> Result<Value> {
        let mut state = self.state.lock();

        if script.contains("createDocumentFragment") {
            let selector = match args.first() {
                Some(ScriptArg::Value(Value::String(s))) => s.clone(),
                _ => return Err(Error::script_error("probe expects a selector string")),
            };
            return Ok(Value::Bool(state.css_valid.contains(&selector)));
        }

        if script.contains("dragstart") {
            if let (Some(ScriptArg::Node(_)), Some(ScriptArg::Node(target))) =
                (args.first(), args.get(1))
            {
                let target = target.as_str().to_string();
                state.drop_onto(&target);
                return Ok(Value::Null);
            }
            return Err(Error::script_error("drag script expects two nodes"));
        }

        if script.contains("selectedIndex") {
            if let (Some(ScriptArg::Node(select)), Some(ScriptArg::Value(index))) =
                (args.first(), args.get(1))
            {
                let select = select.as_str().to_string();
                let index = index.as_u64().unwrap_or(u64::MAX) as usize;
                let options = state.options_of(&select);
                return Ok(Value::Bool(match options.get(index) {
                    Some(chosen) => {
                        let chosen = chosen.clone();
                        state.choose_option(&select, &chosen);
                        true
                    }
                    None => false,
                }));
            }
        }

        if script.contains("o.value === value") || script.contains("o.text.trim()") {
            if let (Some(ScriptArg::Node(select)), Some(ScriptArg::Value(Value::String(wanted)))) =
                (args.first(), args.get(1))
            {
                let select = select.as_str().to_string();
                let by_value = script.contains("o.value === value");
                let wanted = wanted.clone();
                let chosen = state.options_of(&select).into_iter().find(|id| {
                    state.node(id).is_some_and(|n| {
                        if by_value {
                            n.attrs.get("value") == Some(&wanted)
                        } else {
                            n.text.trim() == wanted
                        }
                    })
                });
                return Ok(Value::Bool(match chosen {
                    Some(chosen) => {
                        state.choose_option(&select, &chosen);
                        true
                    }
                    None => false,
                }));
            }
        }

        if script.contains("navigator.userAgent") {
            return Ok(state.user_agent.clone());
        }

        Ok(Value::Null)
    }

    async fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock();
        let pos = state.history_pos;
        if !state.history.is_empty() {
            state.history.truncate(pos + 1);
        }
        state.history.push(url.to_string());
        state.history_pos = state.history.len() - 1;
        state.url = url.to_string();
        Ok(())
    }

    async fn back(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.history_pos > 0 {
            state.history_pos -= 1;
            state.url = state.history[state.history_pos].clone();
        }
        Ok(())
    }

    async fn forward(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.history_pos + 1 < state.history.len() {
            state.history_pos += 1;
            state.url = state.history[state.history_pos].clone();
        }
        Ok(())
    }

    async fn refresh(&self) -> Result<()> {
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let mut state = self.state.lock();
        state.url_reads += 1;
        Ok(state.url.clone())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.state.lock().title.clone())
    }

    async fn page_source(&self) -> Result<String> {
        Ok("<html></html>".to_string())
    }

    async fn text(&self, node: &NodeRef) -> Result<String> {
        let mut state = self.state.lock();
        Ok(state.live_node_mut(node.as_str())?.text.clone())
    }

    async fn attribute(&self, node: &NodeRef, name: &str) -> Result<Option<String>> {
        let mut state = self.state.lock();
        Ok(state.live_node_mut(node.as_str())?.attrs.get(name).cloned())
    }

    async fn is_displayed(&self, node: &NodeRef) -> Result<bool> {
        let mut state = self.state.lock();
        let node = state.live_node_mut(node.as_str())?;
        if node.displayed_after > 0 {
            node.displayed_after -= 1;
            return Ok(false);
        }
        Ok(node.displayed)
    }

    async fn is_enabled(&self, node: &NodeRef) -> Result<bool> {
        let mut state = self.state.lock();
        let node = state.live_node_mut(node.as_str())?;
        if node.enabled_after > 0 {
            node.enabled_after -= 1;
            return Ok(false);
        }
        Ok(node.enabled)
    }

    async fn is_selected(&self, node: &NodeRef) -> Result<bool> {
        let mut state = self.state.lock();
        Ok(state.live_node_mut(node.as_str())?.selected)
    }

    async fn click(&self, node: &NodeRef) -> Result<()> {
        let mut state = self.state.lock();
        let target = state.live_node_mut(node.as_str())?;
        if target.checkbox {
            target.selected = !target.selected;
        }
        let id = target.id.clone();
        state.pointer_log.push(format!("click:{id}"));
        Ok(())
    }

    async fn send_keys(&self, node: &NodeRef, text: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.live_node_mut(node.as_str())?;
        state
            .typed
            .push((node.as_str().to_string(), text.to_string()));
        Ok(())
    }

    async fn clear(&self, node: &NodeRef) -> Result<()> {
        let mut state = self.state.lock();
        state.live_node_mut(node.as_str())?.text.clear();
        Ok(())
    }

    async fn hover(&self, node: &NodeRef) -> Result<()> {
        let mut state = self.state.lock();
        state.live_node_mut(node.as_str())?;
        let id = node.as_str().to_string();
        state.pointer_log.push(format!("hover:{id}"));
        Ok(())
    }

    async fn double_click(&self, node: &NodeRef) -> Result<()> {
        let mut state = self.state.lock();
        state.live_node_mut(node.as_str())?;
        let id = node.as_str().to_string();
        state.pointer_log.push(format!("double:{id}"));
        Ok(())
    }

    async fn context_click(&self, node: &NodeRef) -> Result<()> {
        let mut state = self.state.lock();
        state.live_node_mut(node.as_str())?;
        let id = node.as_str().to_string();
        state.pointer_log.push(format!("context:{id}"));
        Ok(())
    }

    async fn pointer_down(&self, node: &NodeRef) -> Result<()> {
        let mut state = self.state.lock();
        state.live_node_mut(node.as_str())?;
        let id = node.as_str().to_string();
        state.held = Some(id.clone());
        state.held_over = None;
        state.pointer_log.push(format!("down:{id}"));
        Ok(())
    }

    async fn pointer_move(&self, node: &NodeRef) -> Result<()> {
        let mut state = self.state.lock();
        state.live_node_mut(node.as_str())?;
        let id = node.as_str().to_string();
        if state.held.is_some() {
            state.held_over = Some(id.clone());
        }
        state.pointer_log.push(format!("move:{id}"));
        Ok(())
    }

    async fn pointer_up(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.pointer_log.push("up".to_string());
        if state.held.take().is_some() {
            if let Some(target) = state.held_over.take() {
                state.drop_onto(&target);
            }
        }
        Ok(())
    }

    async fn scroll_to(&self, node: &NodeRef) -> Result<()> {
        let mut state = self.state.lock();
        state.live_node_mut(node.as_str())?;
        let id = node.as_str().to_string();
        state.pointer_log.push(format!("scroll:{id}"));
        Ok(())
    }

    async fn scroll_by(&self, x: i64, y: i64) -> Result<()> {
        self.state.lock().pointer_log.push(format!("scroll:{x},{y}"));
        Ok(())
    }

    async fn window_handles(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().window_handles.clone())
    }

    async fn current_window_handle(&self) -> Result<String> {
        let state = self.state.lock();
        Ok(state.window_handles[state.focused_window].clone())
    }

    async fn switch_to_window(&self, handle: &str) -> Result<()> {
        let mut state = self.state.lock();
        match state.window_handles.iter().position(|h| h == handle) {
            Some(pos) => {
                state.focused_window = pos;
                Ok(())
            }
            None => Err(Error::driver(format!("no such window: {handle}"))),
        }
    }

    async fn new_window(&self, _kind: NewWindowKind) -> Result<()> {
        let mut state = self.state.lock();
        let handle = format!("w{}", state.window_handles.len());
        state.window_handles.push(handle);
        state.focused_window = state.window_handles.len() - 1;
        Ok(())
    }

    async fn switch_to_frame(&self, node: &NodeRef) -> Result<()> {
        let mut state = self.state.lock();
        state.live_node_mut(node.as_str())?;
        let id = node.as_str().to_string();
        state.frame_stack.push(id);
        Ok(())
    }

    async fn switch_to_parent_frame(&self) -> Result<()> {
        self.state.lock().frame_stack.pop();
        Ok(())
    }

    async fn switch_to_default_content(&self) -> Result<()> {
        self.state.lock().frame_stack.clear();
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<Cookie>> {
        Ok(self.state.lock().cookies.clone())
    }

    async fn add_cookie(&self, cookie: Cookie) -> Result<()> {
        self.state.lock().cookies.push(cookie);
        Ok(())
    }

    async fn delete_cookie(&self, name: &str) -> Result<()> {
        self.state.lock().cookies.retain(|c| c.name != name);
        Ok(())
    }

    async fn delete_all_cookies(&self) -> Result<()> {
        self.state.lock().cookies.clear();
        Ok(())
    }
}
