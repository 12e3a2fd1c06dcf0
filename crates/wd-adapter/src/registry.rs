//! Handle table for live WebDriver elements.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use fantoccini::elements::Element;
use sureclick_core_types::{DriverError, ElementRef};

/// Concurrent map from engine handles to fantoccini elements.
///
/// Handles are keyed by the W3C element id, so repeated lookups of the same
/// node share one entry and the table grows with the page, not with polling.
/// A handle whose node left the DOM yields a stale-element error from the
/// browser on next use.
pub struct ElementRegistry {
    elements: DashMap<ElementRef, Element>,
    by_node: DashMap<String, ElementRef>,
    next: AtomicU64,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self {
            elements: DashMap::new(),
            by_node: DashMap::new(),
            next: AtomicU64::new(1),
        }
    }

    pub fn register(&self, element: Element) -> ElementRef {
        let handle = self.handle_for(&element.element_id().to_string());
        self.elements.insert(handle.clone(), element);
        handle
    }

    fn handle_for(&self, node_id: &str) -> ElementRef {
        self.by_node
            .entry(node_id.to_string())
            .or_insert_with(|| {
                let id = self.next.fetch_add(1, Ordering::Relaxed);
                ElementRef(format!("wd-{}", id))
            })
            .value()
            .clone()
    }

    /// Unknown handles are reported as stale; the engine re-resolves them.
    pub fn get(&self, handle: &ElementRef) -> Result<Element, DriverError> {
        self.elements
            .get(handle)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DriverError::stale(format!("{} is not a handle of this session", handle)))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn clear(&self) {
        self.elements.clear();
        self.by_node.clear();
    }
}

impl Default for ElementRegistry {
    fn default() -> Self {
        Self::new()
    }
}
