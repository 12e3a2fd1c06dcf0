//! Core types for paginated search

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sureclick_core_types::{DriverError, ElementRef, EngineError, Locator, LocatorSet};
use sureclick_driver_port::Driver;

/// Predicate evaluated against one table row.
///
/// Must only read the DOM.
#[async_trait]
pub trait RowPredicate: Send + Sync {
    async fn matches(&self, driver: &dyn Driver, row: &ElementRef) -> Result<bool, DriverError>;

    /// Human-readable description used in error context
    fn describe(&self) -> String;
}

/// Optional narrowing step run once before the first page is inspected.
///
/// Failure is advisory: the search logs it and pages through the
/// unfiltered table.
#[async_trait]
pub trait FilterAction: Send + Sync {
    async fn apply(&self, driver: &dyn Driver) -> Result<(), EngineError>;

    fn describe(&self) -> String;
}

/// Where the table rows and pager controls live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    /// Matches every row of the current page, in display order
    pub rows: Locator,

    /// Next-page control
    pub next: LocatorSet,

    /// Loading indicator that must clear after a page change
    pub loading: Option<Locator>,

    /// Control that returns to page one before searching
    pub first_page: Option<LocatorSet>,
}

impl Pager {
    pub fn new(rows: Locator, next: LocatorSet) -> Self {
        Self {
            rows,
            next,
            loading: None,
            first_page: None,
        }
    }

    pub fn with_loading(mut self, loading: Locator) -> Self {
        self.loading = Some(loading);
        self
    }

    pub fn with_first_page(mut self, first_page: LocatorSet) -> Self {
        self.first_page = Some(first_page);
        self
    }

    /// Ant Design table and pagination markup.
    pub fn ant_design() -> Self {
        Self::new(
            Locator::css(".ant-table-tbody > tr.ant-table-row"),
            LocatorSet::single(Locator::css(".ant-pagination-next"))
                .or(Locator::css(".ant-pagination-next button.ant-pagination-item-link")),
        )
        .with_loading(Locator::css(".ant-spin-spinning"))
    }
}

/// What to look for and how far to look
#[derive(Clone)]
pub struct SearchTarget {
    pub predicate: Arc<dyn RowPredicate>,
    pub filter: Option<Arc<dyn FilterAction>>,
    /// Pages inspected at most, the current page included; `None` uses the
    /// policy default
    pub max_page_hops: Option<u32>,
    pub pager: Pager,
}

impl fmt::Debug for SearchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchTarget")
            .field("predicate", &self.predicate.describe())
            .field("filter", &self.filter.as_ref().map(|f| f.describe()))
            .field("max_page_hops", &self.max_page_hops)
            .field("pager", &self.pager)
            .finish()
    }
}

impl SearchTarget {
    pub fn new(predicate: impl RowPredicate + 'static, pager: Pager) -> Self {
        Self {
            predicate: Arc::new(predicate),
            filter: None,
            max_page_hops: None,
            pager,
        }
    }

    pub fn with_filter(mut self, filter: impl FilterAction + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn with_max_page_hops(mut self, hops: u32) -> Self {
        self.max_page_hops = Some(hops);
        self
    }

    pub fn describe(&self) -> String {
        self.predicate.describe()
    }
}

/// Per-call search state; dropped when the search returns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSession {
    pub pages_visited: u32,
    pub last_signature: Option<u64>,
    pub found: Option<ElementRef>,
    /// Consecutive advances that left the rows unchanged
    pub stalled_advances: u32,
}

/// A matching row and how many pages were inspected to find it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub row: ElementRef,
    pub pages_visited: u32,
}
