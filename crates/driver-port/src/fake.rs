//! In-memory DOM implementing `Driver`, for tests.
//!
//! Elements are registered under a (strategy, selector) key and returned by
//! exact key lookup; no selector engine is involved. Time-based behaviour
//! (late appearance, vanishing spinners) uses `tokio::time::Instant`, so it
//! follows a paused test clock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use sureclick_core_types::{DriverError, DriverErrorKind, ElementRef, LocatorStrategy};
use tokio::time::Instant;

use crate::driver::{Driver, ScriptArg};
use crate::hook::{EvidenceHook, HookError};
use crate::scripts::{
    KEY_ENTER, SCRIPT_CLICK, SCRIPT_DISPATCH_INPUT, SCRIPT_SCROLL_INTO_VIEW, SCRIPT_SET_VALUE,
};

/// Mutation applied to the DOM when an element is clicked or submitted.
pub type Effect = Arc<dyn Fn(&mut DomState) + Send + Sync>;

/// How a native click on the element behaves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ClickBehavior {
    #[default]
    Normal,
    /// Covered by an overlay for the given number of native clicks
    Intercepted(u32),
    NotInteractable,
    /// The first interaction finds the node replaced by an identical one
    DetachOnFirstUse,
}

#[derive(Clone)]
pub struct FakeElement {
    pub text: String,
    pub value: String,
    pub displayed: bool,
    pub enabled: bool,
    pub attributes: HashMap<String, String>,
    pub click: ClickBehavior,
    on_click: Option<Effect>,
    on_submit: Option<Effect>,
    appear_after: Option<Duration>,
    vanish_after: Option<Duration>,
}

impl Default for FakeElement {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeElement {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            value: String::new(),
            displayed: true,
            enabled: true,
            attributes: HashMap::new(),
            click: ClickBehavior::Normal,
            on_click: None,
            on_submit: None,
            appear_after: None,
            vanish_after: None,
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
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

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn intercepted(mut self) -> Self {
        self.click = ClickBehavior::Intercepted(u32::MAX);
        self
    }

    pub fn intercepted_times(mut self, times: u32) -> Self {
        self.click = ClickBehavior::Intercepted(times);
        self
    }

    pub fn not_interactable(mut self) -> Self {
        self.click = ClickBehavior::NotInteractable;
        self
    }

    pub fn detach_on_first_use(mut self) -> Self {
        self.click = ClickBehavior::DetachOnFirstUse;
        self
    }

    pub fn on_click(mut self, effect: impl Fn(&mut DomState) + Send + Sync + 'static) -> Self {
        self.on_click = Some(Arc::new(effect));
        self
    }

    pub fn on_submit(mut self, effect: impl Fn(&mut DomState) + Send + Sync + 'static) -> Self {
        self.on_submit = Some(Arc::new(effect));
        self
    }

    /// Not returned by lookups until `delay` after insertion.
    pub fn appears_after(mut self, delay: Duration) -> Self {
        self.appear_after = Some(delay);
        self
    }

    /// Detached `delay` after insertion.
    pub fn vanishes_after(mut self, delay: Duration) -> Self {
        self.vanish_after = Some(delay);
        self
    }
}

struct Node {
    element: FakeElement,
    key: (LocatorStrategy, String),
    parent: Option<usize>,
    attached: bool,
    appears_at: Option<Instant>,
    vanishes_at: Option<Instant>,
}

struct PagerState {
    rows_key: (LocatorStrategy, String),
    all_rows: Vec<String>,
    pages: Vec<Vec<String>>,
    page_size: usize,
    current: usize,
    stuck: bool,
    with_cells: bool,
    next: ElementRef,
}

/// Mutable DOM state, handed to click/submit effects.
pub struct DomState {
    nodes: Vec<Node>,
    url: String,
    clicks: HashMap<usize, u32>,
    scripts: Vec<String>,
    script_results: HashMap<String, Value>,
    find_calls: u32,
    pager: Option<PagerState>,
}

fn element_ref(idx: usize) -> ElementRef {
    ElementRef(format!("e{}", idx))
}

fn index_of(element: &ElementRef) -> Option<usize> {
    element.0.strip_prefix('e')?.parse().ok()
}

fn stale(element: &ElementRef) -> DriverError {
    DriverError::stale(format!("{} is no longer attached to the DOM", element))
}

impl DomState {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            url: "about:blank".to_string(),
            clicks: HashMap::new(),
            scripts: Vec::new(),
            script_results: HashMap::new(),
            find_calls: 0,
            pager: None,
        }
    }

    fn push(
        &mut self,
        key: (LocatorStrategy, String),
        parent: Option<usize>,
        element: FakeElement,
    ) -> ElementRef {
        let now = Instant::now();
        let appears_at = element.appear_after.map(|delay| now + delay);
        let vanishes_at = element.vanish_after.map(|delay| now + delay);
        self.nodes.push(Node {
            element,
            key,
            parent,
            attached: true,
            appears_at,
            vanishes_at,
        });
        element_ref(self.nodes.len() - 1)
    }

    pub fn insert(
        &mut self,
        strategy: LocatorStrategy,
        selector: &str,
        element: FakeElement,
    ) -> ElementRef {
        self.push((strategy, selector.to_string()), None, element)
    }

    pub fn insert_child(
        &mut self,
        parent: &ElementRef,
        strategy: LocatorStrategy,
        selector: &str,
        element: FakeElement,
    ) -> ElementRef {
        let parent = index_of(parent);
        self.push((strategy, selector.to_string()), parent, element)
    }

    pub fn detach(&mut self, element: &ElementRef) {
        if let Some(node) = index_of(element).and_then(|idx| self.nodes.get_mut(idx)) {
            node.attached = false;
        }
    }

    pub fn detach_all(&mut self, strategy: LocatorStrategy, selector: &str) {
        for node in self.nodes.iter_mut() {
            if node.key.0 == strategy && node.key.1 == selector {
                node.attached = false;
            }
        }
    }

    pub fn element_mut(&mut self, element: &ElementRef) -> Option<&mut FakeElement> {
        let idx = index_of(element)?;
        self.nodes.get_mut(idx).map(|node| &mut node.element)
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn value_of(&self, element: &ElementRef) -> Option<String> {
        let idx = index_of(element)?;
        self.nodes.get(idx).map(|node| node.element.value.clone())
    }

    fn is_live(&self, idx: usize, now: Instant) -> bool {
        let Some(node) = self.nodes.get(idx) else {
            return false;
        };
        if !node.attached {
            return false;
        }
        if node.appears_at.map(|at| now < at).unwrap_or(false) {
            return false;
        }
        if node.vanishes_at.map(|at| now >= at).unwrap_or(false) {
            return false;
        }
        match node.parent {
            Some(parent) => self.is_live(parent, now),
            None => true,
        }
    }

    fn live(&self, element: &ElementRef) -> Result<usize, DriverError> {
        let idx = index_of(element).ok_or_else(|| stale(element))?;
        if self.is_live(idx, Instant::now()) {
            Ok(idx)
        } else {
            Err(stale(element))
        }
    }

    /// Live check for interactions; consumes `DetachOnFirstUse`.
    fn touch(&mut self, element: &ElementRef) -> Result<usize, DriverError> {
        let idx = self.live(element)?;
        if self.nodes[idx].element.click == ClickBehavior::DetachOnFirstUse {
            let mut replacement = self.nodes[idx].element.clone();
            replacement.click = ClickBehavior::Normal;
            replacement.appear_after = None;
            replacement.vanish_after = None;
            let key = self.nodes[idx].key.clone();
            let parent = self.nodes[idx].parent;
            self.nodes[idx].attached = false;
            self.push(key, parent, replacement);
            return Err(stale(element));
        }
        Ok(idx)
    }

    fn record_click(&mut self, idx: usize) -> Option<Effect> {
        *self.clicks.entry(idx).or_insert(0) += 1;
        if self.nodes[idx].element.enabled {
            self.nodes[idx].element.on_click.clone()
        } else {
            None
        }
    }

    fn matching(&self, key: (LocatorStrategy, &str), parent: Option<usize>) -> Vec<ElementRef> {
        let now = Instant::now();
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                node.key.0 == key.0 && node.key.1 == key.1 && node.parent == parent
            })
            .filter(|(idx, _)| self.is_live(*idx, now))
            .map(|(idx, _)| element_ref(idx))
            .collect()
    }

    fn render_pager(&mut self) {
        let Some(pager) = self.pager.as_ref() else {
            return;
        };
        let rows_key = pager.rows_key.clone();
        let rows = pager.pages.get(pager.current).cloned().unwrap_or_default();
        let with_cells = pager.with_cells;
        let last_page = pager.current + 1 >= pager.pages.len();
        let next = pager.next.clone();

        self.detach_all(rows_key.0, &rows_key.1);
        for text in rows {
            let row = self.insert(rows_key.0, &rows_key.1, FakeElement::new().text(text.clone()));
            if with_cells {
                self.insert_child(
                    &row,
                    LocatorStrategy::Css,
                    PAGER_CELL,
                    FakeElement::new().text(text),
                );
            }
        }
        if let Some(button) = self.element_mut(&next) {
            if last_page {
                button.attributes.insert("disabled".into(), "true".into());
            } else {
                button.attributes.remove("disabled");
            }
        }
    }

    /// Move the installed pager forward one page (or re-render the same
    /// rows when stuck).
    pub fn advance_pager(&mut self) {
        let Some(pager) = self.pager.as_mut() else {
            return;
        };
        if !pager.stuck && pager.current + 1 < pager.pages.len() {
            pager.current += 1;
        }
        self.render_pager();
    }

    /// Restrict the installed pager to rows containing `needle`.
    pub fn filter_pager(&mut self, needle: &str) {
        let Some(pager) = self.pager.as_mut() else {
            return;
        };
        let needle = needle.trim().to_lowercase();
        let rows: Vec<String> = pager
            .all_rows
            .iter()
            .filter(|row| row.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        pager.pages = paginate(rows, pager.page_size);
        pager.current = 0;
        self.render_pager();
    }

    pub fn rewind_pager(&mut self) {
        if let Some(pager) = self.pager.as_mut() {
            pager.current = 0;
        }
        self.render_pager();
    }
}

fn paginate(rows: Vec<String>, page_size: usize) -> Vec<Vec<String>> {
    if rows.is_empty() {
        return vec![Vec::new()];
    }
    rows.chunks(page_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// In-memory DOM for one simulated browser session.
pub struct FakeDom {
    state: Mutex<DomState>,
}

impl Default for FakeDom {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDom {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DomState::new()),
        }
    }

    pub fn insert(
        &self,
        strategy: LocatorStrategy,
        selector: &str,
        element: FakeElement,
    ) -> ElementRef {
        self.state.lock().insert(strategy, selector, element)
    }

    pub fn insert_css(&self, selector: &str, element: FakeElement) -> ElementRef {
        self.insert(LocatorStrategy::Css, selector, element)
    }

    pub fn insert_child(
        &self,
        parent: &ElementRef,
        strategy: LocatorStrategy,
        selector: &str,
        element: FakeElement,
    ) -> ElementRef {
        self.state
            .lock()
            .insert_child(parent, strategy, selector, element)
    }

    pub fn detach(&self, element: &ElementRef) {
        self.state.lock().detach(element);
    }

    /// Detach `element` and insert an identical node under the same key.
    pub fn replace(&self, element: &ElementRef) -> Option<ElementRef> {
        let mut state = self.state.lock();
        let idx = index_of(element)?;
        let node = state.nodes.get(idx)?;
        let copy = node.element.clone();
        let key = node.key.clone();
        let parent = node.parent;
        state.detach(element);
        Some(state.push(key, parent, copy))
    }

    pub fn set_url(&self, url: impl Into<String>) {
        self.state.lock().set_url(url);
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut DomState) -> R) -> R {
        f(&mut self.state.lock())
    }

    pub fn on_script(&self, code: &str, result: Value) {
        self.state
            .lock()
            .script_results
            .insert(code.to_string(), result);
    }

    pub fn click_count(&self, element: &ElementRef) -> u32 {
        let state = self.state.lock();
        index_of(element)
            .and_then(|idx| state.clicks.get(&idx).copied())
            .unwrap_or(0)
    }

    pub fn value_of(&self, element: &ElementRef) -> Option<String> {
        self.state.lock().value_of(element)
    }

    pub fn scripts_run(&self) -> Vec<String> {
        self.state.lock().scripts.clone()
    }

    pub fn find_calls(&self) -> u32 {
        self.state.lock().find_calls
    }

    /// Zero-based page index of the installed pager.
    pub fn current_page(&self) -> Option<usize> {
        self.state.lock().pager.as_ref().map(|pager| pager.current)
    }
}

fn element_arg(args: &[ScriptArg], position: usize) -> Result<ElementRef, DriverError> {
    match args.get(position) {
        Some(ScriptArg::Element(element)) => Ok(element.clone()),
        _ => Err(DriverError::new(
            DriverErrorKind::Script,
            format!("arguments[{}] is not an element", position),
        )),
    }
}

#[async_trait]
impl Driver for FakeDom {
    async fn find_elements(
        &self,
        strategy: LocatorStrategy,
        selector: &str,
    ) -> Result<Vec<ElementRef>, DriverError> {
        let mut state = self.state.lock();
        state.find_calls += 1;
        Ok(state.matching((strategy, selector), None))
    }

    async fn find_within(
        &self,
        parent: &ElementRef,
        strategy: LocatorStrategy,
        selector: &str,
    ) -> Result<Vec<ElementRef>, DriverError> {
        let mut state = self.state.lock();
        state.find_calls += 1;
        let parent = state.live(parent)?;
        Ok(state.matching((strategy, selector), Some(parent)))
    }

    async fn click(&self, element: &ElementRef) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        let idx = state.touch(element)?;
        let node = &mut state.nodes[idx].element;
        match node.click {
            ClickBehavior::Intercepted(remaining) if remaining > 0 => {
                if remaining != u32::MAX {
                    node.click = ClickBehavior::Intercepted(remaining - 1);
                }
                return Err(DriverError::intercepted(format!(
                    "{} is covered by another element",
                    element
                )));
            }
            ClickBehavior::NotInteractable => {
                return Err(DriverError::not_interactable(format!(
                    "{} cannot be clicked",
                    element
                )));
            }
            _ => {}
        }
        if !node.displayed {
            return Err(DriverError::not_interactable(format!(
                "{} is not displayed",
                element
            )));
        }
        if let Some(effect) = state.record_click(idx) {
            effect(&mut *state);
        }
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        let idx = state.touch(element)?;
        let node = &mut state.nodes[idx].element;
        if !node.displayed || node.click == ClickBehavior::NotInteractable {
            return Err(DriverError::not_interactable(format!(
                "{} does not accept keys",
                element
            )));
        }
        node.value.push_str(&text.replace(KEY_ENTER, ""));
        if text.contains(KEY_ENTER) {
            if let Some(effect) = node.on_submit.clone() {
                effect(&mut *state);
            }
        }
        Ok(())
    }

    async fn clear(&self, element: &ElementRef) -> Result<(), DriverError> {
        let mut state = self.state.lock();
        let idx = state.touch(element)?;
        state.nodes[idx].element.value.clear();
        Ok(())
    }

    async fn execute_script(
        &self,
        code: &str,
        args: Vec<ScriptArg>,
    ) -> Result<Value, DriverError> {
        let mut state = self.state.lock();
        state.scripts.push(code.to_string());
        match code {
            SCRIPT_CLICK => {
                let idx = state.touch(&element_arg(&args, 0)?)?;
                if let Some(effect) = state.record_click(idx) {
                    effect(&mut *state);
                }
                Ok(Value::Null)
            }
            SCRIPT_SCROLL_INTO_VIEW | SCRIPT_DISPATCH_INPUT => {
                state.touch(&element_arg(&args, 0)?)?;
                Ok(Value::Null)
            }
            SCRIPT_SET_VALUE => {
                let idx = state.touch(&element_arg(&args, 0)?)?;
                let value = match args.get(1) {
                    Some(ScriptArg::Json(Value::String(text))) => text.clone(),
                    Some(ScriptArg::Json(other)) => other.to_string(),
                    _ => String::new(),
                };
                state.nodes[idx].element.value = value;
                Ok(Value::Null)
            }
            other => Ok(state
                .script_results
                .get(other)
                .cloned()
                .unwrap_or(Value::Null)),
        }
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.state.lock().url.clone())
    }

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool, DriverError> {
        let state = self.state.lock();
        let idx = state.live(element)?;
        Ok(state.nodes[idx].element.displayed)
    }

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool, DriverError> {
        let state = self.state.lock();
        let idx = state.live(element)?;
        Ok(state.nodes[idx].element.enabled)
    }

    async fn get_attribute(
        &self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let state = self.state.lock();
        let idx = state.live(element)?;
        let node = &state.nodes[idx].element;
        if name == "value" {
            return Ok(Some(node.value.clone()));
        }
        Ok(node.attributes.get(name).cloned())
    }

    async fn text(&self, element: &ElementRef) -> Result<String, DriverError> {
        let state = self.state.lock();
        let idx = state.live(element)?;
        Ok(state.nodes[idx].element.text.clone())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }
}

pub const PAGER_ROWS: &str = ".ant-table-tbody > tr.ant-table-row";
pub const PAGER_NEXT: &str = ".ant-pagination-next";
pub const PAGER_CELL: &str = "td:nth-child(1)";
pub const PAGER_SEARCH_INPUT: &str = ".ant-input-search input.ant-input";
pub const PAGER_SEARCH_BUTTON: &str = ".ant-input-search-button";
pub const PAGER_FIRST: &str = ".ant-pagination-item-1";

/// Paginated table installed into a `FakeDom`.
///
/// Rows live under `PAGER_ROWS` (CSS); the next control under `PAGER_NEXT`
/// carries `disabled="true"` on the last page. Every page change re-creates
/// the row nodes, so handles from a previous page go stale.
pub struct FakePager {
    rows: Vec<String>,
    page_size: usize,
    stuck: bool,
    with_cells: bool,
    with_search: bool,
}

pub struct PagerHandles {
    pub next: ElementRef,
    pub search_input: Option<ElementRef>,
    pub search_button: Option<ElementRef>,
    pub first_page: ElementRef,
}

impl FakePager {
    pub fn new<S: Into<String>>(rows: impl IntoIterator<Item = S>, page_size: usize) -> Self {
        Self {
            rows: rows.into_iter().map(Into::into).collect(),
            page_size,
            stuck: false,
            with_cells: false,
            with_search: false,
        }
    }

    /// Next control re-renders the same rows instead of advancing.
    pub fn stuck(mut self) -> Self {
        self.stuck = true;
        self
    }

    /// Give each row a `PAGER_CELL` child holding its text.
    pub fn with_cells(mut self) -> Self {
        self.with_cells = true;
        self
    }

    /// Add a search box whose submit filters rows by substring.
    pub fn with_search(mut self) -> Self {
        self.with_search = true;
        self
    }

    pub fn install(self, dom: &FakeDom) -> PagerHandles {
        let mut state = dom.state.lock();
        let next = state.insert(
            LocatorStrategy::Css,
            PAGER_NEXT,
            FakeElement::new().on_click(|dom| dom.advance_pager()),
        );
        let first_page = state.insert(
            LocatorStrategy::Css,
            PAGER_FIRST,
            FakeElement::new().on_click(|dom| dom.rewind_pager()),
        );

        let (search_input, search_button) = if self.with_search {
            let input = state.insert(
                LocatorStrategy::Css,
                PAGER_SEARCH_INPUT,
                FakeElement::new(),
            );
            let submit = {
                let input = input.clone();
                move |dom: &mut DomState| {
                    let needle = dom.value_of(&input).unwrap_or_default();
                    dom.filter_pager(&needle);
                }
            };
            let button = state.insert(
                LocatorStrategy::Css,
                PAGER_SEARCH_BUTTON,
                FakeElement::new().on_click(submit.clone()),
            );
            if let Some(element) = state.element_mut(&input) {
                element.on_submit = Some(Arc::new(submit));
            }
            (Some(input), Some(button))
        } else {
            (None, None)
        };

        state.pager = Some(PagerState {
            rows_key: (LocatorStrategy::Css, PAGER_ROWS.to_string()),
            pages: paginate(self.rows.clone(), self.page_size),
            all_rows: self.rows,
            page_size: self.page_size,
            current: 0,
            stuck: self.stuck,
            with_cells: self.with_cells,
            next: next.clone(),
        });
        state.render_pager();

        PagerHandles {
            next,
            search_input,
            search_button,
            first_page,
        }
    }
}

/// Hook that records every checkpoint label.
#[derive(Default)]
pub struct RecordingHook {
    labels: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records labels but reports failure for each one.
    pub fn failing() -> Self {
        Self {
            labels: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().clone()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.labels
            .lock()
            .iter()
            .filter(|label| label.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl EvidenceHook for RecordingHook {
    async fn on_checkpoint(&self, label: &str) -> Result<(), HookError> {
        self.labels.lock().push(label.to_string());
        if self.fail {
            return Err(HookError::Capture(format!("refusing '{}'", label)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn delayed_element_appears() {
        let dom = FakeDom::new();
        dom.insert_css(
            "#toast",
            FakeElement::new().appears_after(Duration::from_millis(300)),
        );
        assert!(dom
            .find_elements(LocatorStrategy::Css, "#toast")
            .await
            .unwrap()
            .is_empty());
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(
            dom.find_elements(LocatorStrategy::Css, "#toast")
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn detached_element_is_stale() {
        let dom = FakeDom::new();
        let el = dom.insert_css("#save", FakeElement::new());
        dom.detach(&el);
        let err = dom.click(&el).await.unwrap_err();
        assert!(err.is_stale());
    }

    #[tokio::test]
    async fn pager_advances_and_disables_next() {
        let dom = FakeDom::new();
        let handles = FakePager::new(["a", "b", "c"], 2).install(&dom);
        assert_eq!(
            dom.get_attribute(&handles.next, "disabled").await.unwrap(),
            None
        );
        let first_rows = dom
            .find_elements(LocatorStrategy::Css, PAGER_ROWS)
            .await
            .unwrap();
        dom.click(&handles.next).await.unwrap();
        assert_eq!(dom.current_page(), Some(1));
        assert!(dom.text(&first_rows[0]).await.unwrap_err().is_stale());
        assert_eq!(
            dom.get_attribute(&handles.next, "disabled").await.unwrap(),
            Some("true".into())
        );
    }

    #[tokio::test]
    async fn search_box_filters_rows() {
        let dom = FakeDom::new();
        let handles = FakePager::new(["Ana", "Beto", "Carla"], 1)
            .with_search()
            .install(&dom);
        let input = handles.search_input.unwrap();
        dom.send_keys(&input, "carla").await.unwrap();
        dom.send_keys(&input, KEY_ENTER).await.unwrap();
        let rows = dom
            .find_elements(LocatorStrategy::Css, PAGER_ROWS)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(dom.text(&rows[0]).await.unwrap(), "Carla");
    }
}
