//! Paginated search loop

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use action_gate::{Condition, DefaultReadinessGate, DomPredicate, Mode, ReadinessGate, ReadinessSpec};
use async_trait::async_trait;
use sureclick_core_types::{DriverError, ElementRef, EngineError, Locator, LocatorSet, LocatorStrategy};
use sureclick_driver_port::scripts::SCRIPT_CLICK;
use sureclick_driver_port::{checkpoint, checkpoint_label, Driver, EvidenceHook, ScriptArg};
use sureclick_policy_center::SearchPolicy;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use crate::types::{SearchHit, SearchSession, SearchTarget};

/// Consecutive unchanged advances tolerated before giving up
pub const NO_PROGRESS_LIMIT: u32 = 2;

/// Extra reads of a page whose rows went stale mid-inspection
const STALE_REREADS: u32 = 2;

/// Paginated search trait
#[async_trait]
pub trait PaginatedSearch: Send + Sync {
    async fn find_across_pages(
        &self,
        driver: &dyn Driver,
        target: &SearchTarget,
    ) -> Result<SearchHit, EngineError>;
}

/// Default paginated search implementation
pub struct DefaultPaginatedSearch {
    policy: SearchPolicy,
    gate: DefaultReadinessGate,
    hook: Arc<dyn EvidenceHook>,
}

/// One inspected page
struct PageRead {
    signature: u64,
    hit: Option<ElementRef>,
}

/// Hash over the ordered row texts of the current page.
pub async fn row_signature(driver: &dyn Driver, rows: &Locator) -> Result<u64, DriverError> {
    read_rows(driver, rows).await.map(|(_, signature)| signature)
}

async fn read_rows(driver: &dyn Driver, rows: &Locator) -> Result<(usize, u64), DriverError> {
    let elements = driver.find_elements(rows.strategy, &rows.selector).await?;
    let mut hasher = DefaultHasher::new();
    elements.len().hash(&mut hasher);
    for element in &elements {
        driver.text(element).await?.hash(&mut hasher);
    }
    Ok((elements.len(), hasher.finish()))
}

/// True once the row set no longer hashes to `previous`.
struct SignatureChanged {
    rows: Locator,
    previous: u64,
    /// An empty tbody counts as still rendering
    require_rows: bool,
}

#[async_trait]
impl DomPredicate for SignatureChanged {
    async fn evaluate(&self, driver: &dyn Driver) -> Result<bool, DriverError> {
        match read_rows(driver, &self.rows).await {
            Ok((0, _)) if self.require_rows => Ok(false),
            Ok((_, signature)) => Ok(signature != self.previous),
            // rows swapped under us; look again next tick
            Err(err) if err.is_stale() => Ok(false),
            Err(err) => Err(err),
        }
    }
}

enum NextControl {
    Missing,
    Disabled,
    Ready(ElementRef),
}

impl DefaultPaginatedSearch {
    pub fn new(policy: &SearchPolicy, hook: Arc<dyn EvidenceHook>) -> Self {
        Self {
            policy: policy.clone(),
            gate: DefaultReadinessGate::new(),
            hook,
        }
    }

    async fn inspect(
        &self,
        driver: &dyn Driver,
        target: &SearchTarget,
    ) -> Result<PageRead, DriverError> {
        let rows = &target.pager.rows;
        let elements = driver.find_elements(rows.strategy, &rows.selector).await?;
        let mut hasher = DefaultHasher::new();
        elements.len().hash(&mut hasher);
        let mut hit = None;
        for element in &elements {
            driver.text(element).await?.hash(&mut hasher);
            if hit.is_none() && target.predicate.matches(driver, element).await? {
                hit = Some(element.clone());
            }
        }
        Ok(PageRead {
            signature: hasher.finish(),
            hit,
        })
    }

    /// Inspect the current page, re-reading when rows detach mid-read.
    async fn read_page(
        &self,
        driver: &dyn Driver,
        target: &SearchTarget,
    ) -> Result<PageRead, EngineError> {
        let mut attempt = 0;
        loop {
            match self.inspect(driver, target).await {
                Ok(page) => return Ok(page),
                Err(err) if err.is_stale() && attempt < STALE_REREADS => {
                    attempt += 1;
                    debug!(attempt, "rows went stale while reading; re-reading page");
                    sleep(self.policy.poll_interval()).await;
                }
                Err(err) if err.is_stale() => {
                    return Err(EngineError::StaleReference {
                        target: target.pager.rows.to_string(),
                        attempts: attempt,
                    })
                }
                Err(err) => return Err(EngineError::Driver(err)),
            }
        }
    }

    async fn next_control(
        &self,
        driver: &dyn Driver,
        next: &LocatorSet,
    ) -> Result<NextControl, EngineError> {
        let mut attempt = 0;
        loop {
            match probe_next(driver, next).await {
                Ok(control) => return Ok(control),
                Err(err) if err.is_stale() && attempt < STALE_REREADS => attempt += 1,
                Err(err) if err.is_stale() => {
                    return Err(EngineError::StaleReference {
                        target: next.to_string(),
                        attempts: attempt,
                    })
                }
                Err(err) => return Err(EngineError::Driver(err)),
            }
        }
    }

    /// Activate the next control and wait for the rows to change.
    /// Returns whether the page actually changed.
    async fn advance(
        &self,
        driver: &dyn Driver,
        target: &SearchTarget,
        control: &ElementRef,
        previous: u64,
    ) -> Result<bool, EngineError> {
        if let Err(err) = driver.click(control).await {
            debug!(error = %err, "native click on next failed; trying script click");
            if let Err(err) = driver
                .execute_script(SCRIPT_CLICK, vec![ScriptArg::Element(control.clone())])
                .await
            {
                warn!(error = %err, "next control could not be activated");
                return Ok(false);
            }
        }

        let mut conditions = vec![Condition::custom(
            "rows changed",
            SignatureChanged {
                rows: target.pager.rows.clone(),
                previous,
                require_rows: false,
            },
        )];
        if let Some(loading) = &target.pager.loading {
            conditions.push(Condition::hidden(loading.clone()));
        }
        let spec = ReadinessSpec::new(
            Mode::All,
            conditions,
            self.policy.rerender_timeout(),
            self.policy.poll_interval(),
        )?;

        match self.gate.await_ready(driver, &spec).await {
            Ok(_) => Ok(true),
            Err(EngineError::Timeout { pending, .. }) => {
                debug!(?pending, "page did not re-render after advance");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Best-effort rewind and filter before the first inspection, then wait
    /// for the table to re-render if either one ran.
    async fn prepare(&self, driver: &dyn Driver, target: &SearchTarget) {
        if target.pager.first_page.is_none() && target.filter.is_none() {
            return;
        }
        let before = match row_signature(driver, &target.pager.rows).await {
            Ok(signature) => Some(signature),
            Err(err) => {
                debug!(error = %err, "rows unreadable before preparing the table");
                None
            }
        };
        let mut changed = false;

        if let Some(first_page) = &target.pager.first_page {
            match probe_next(driver, first_page).await {
                Ok(NextControl::Ready(control)) => {
                    match driver
                        .execute_script(SCRIPT_CLICK, vec![ScriptArg::Element(control)])
                        .await
                    {
                        Ok(_) => changed = true,
                        Err(err) => warn!(error = %err, "could not return to the first page"),
                    }
                }
                Ok(_) => debug!("first-page control unavailable; searching from current page"),
                Err(err) => warn!(error = %err, "first-page lookup failed"),
            }
        }

        if let Some(filter) = &target.filter {
            match filter.apply(driver).await {
                Ok(()) => {
                    debug!(filter = %filter.describe(), "filter applied");
                    changed = true;
                }
                Err(err) => {
                    warn!(filter = %filter.describe(), error = %err, "filter failed; paging unfiltered table")
                }
            }
        }

        if changed {
            self.wait_rerendered(driver, target, before).await;
        }
    }

    /// Wait for a non-empty row set that differs from `before` and for the
    /// loading indicator to clear. A timeout is logged and the search goes on.
    async fn wait_rerendered(&self, driver: &dyn Driver, target: &SearchTarget, before: Option<u64>) {
        let mut conditions = Vec::new();
        if let Some(previous) = before {
            conditions.push(Condition::custom(
                "rows changed",
                SignatureChanged {
                    rows: target.pager.rows.clone(),
                    previous,
                    require_rows: true,
                },
            ));
        }
        if let Some(loading) = &target.pager.loading {
            conditions.push(Condition::hidden(loading.clone()));
        }
        if conditions.is_empty() {
            return;
        }
        let spec = match ReadinessSpec::new(
            Mode::All,
            conditions,
            self.policy.rerender_timeout(),
            self.policy.poll_interval(),
        ) {
            Ok(spec) => spec,
            Err(err) => {
                warn!(error = %err, "cannot build re-render wait");
                return;
            }
        };
        match self.gate.await_ready(driver, &spec).await {
            Ok(outcome) => debug!(elapsed = ?outcome.elapsed, "table re-rendered"),
            Err(err) => warn!(error = %err, "table did not re-render after filter or rewind"),
        }
    }
}

async fn probe_next(driver: &dyn Driver, set: &LocatorSet) -> Result<NextControl, DriverError> {
    for locator in set.candidates() {
        let found = driver
            .find_elements(locator.strategy, &locator.selector)
            .await?;
        if let Some(control) = found.into_iter().next() {
            if is_disabled(driver, &control).await? {
                return Ok(NextControl::Disabled);
            }
            return Ok(NextControl::Ready(control));
        }
    }
    Ok(NextControl::Missing)
}

/// Pager controls signal "no more pages" in several ways depending on the
/// component library.
async fn is_disabled(driver: &dyn Driver, control: &ElementRef) -> Result<bool, DriverError> {
    if !driver.is_displayed(control).await? || !driver.is_enabled(control).await? {
        return Ok(true);
    }
    if let Some(value) = driver.get_attribute(control, "disabled").await? {
        if value != "false" {
            return Ok(true);
        }
    }
    if driver.get_attribute(control, "aria-disabled").await?.as_deref() == Some("true") {
        return Ok(true);
    }
    if class_says_disabled(driver.get_attribute(control, "class").await?) {
        return Ok(true);
    }
    let parents = driver
        .find_within(control, LocatorStrategy::XPath, "..")
        .await?;
    if let Some(parent) = parents.first() {
        if class_says_disabled(driver.get_attribute(parent, "class").await?) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn class_says_disabled(class: Option<String>) -> bool {
    class.map(|c| c.contains("disabled")).unwrap_or(false)
}

#[async_trait]
impl PaginatedSearch for DefaultPaginatedSearch {
    #[instrument(skip_all, fields(target = %target.describe()))]
    async fn find_across_pages(
        &self,
        driver: &dyn Driver,
        target: &SearchTarget,
    ) -> Result<SearchHit, EngineError> {
        let start = Instant::now();
        let max_pages = target.max_page_hops.unwrap_or(self.policy.max_page_hops);
        let mut session = SearchSession::default();
        info!(max_pages, "searching paginated table");

        self.prepare(driver, target).await;

        loop {
            let page = self.read_page(driver, target).await?;
            session.pages_visited += 1;
            session.last_signature = Some(page.signature);
            debug!(page = session.pages_visited, "page inspected");

            if let Some(row) = page.hit {
                info!(pages_visited = session.pages_visited, "row found");
                session.found = Some(row.clone());
                return Ok(SearchHit {
                    row,
                    pages_visited: session.pages_visited,
                });
            }

            if session.pages_visited >= max_pages {
                return Err(not_found(target, start, &session, "page limit reached"));
            }

            session.stalled_advances = 0;
            loop {
                let control = match self.next_control(driver, &target.pager.next).await? {
                    NextControl::Ready(control) => control,
                    NextControl::Disabled => {
                        return Err(not_found(target, start, &session, "last page reached"))
                    }
                    NextControl::Missing => {
                        return Err(not_found(target, start, &session, "no next-page control"))
                    }
                };

                let page_number = session.pages_visited.to_string();
                checkpoint(
                    self.hook.as_ref(),
                    &checkpoint_label("search", "advance:before", &page_number),
                )
                .await;
                let progressed = self
                    .advance(driver, target, &control, page.signature)
                    .await?;
                checkpoint(
                    self.hook.as_ref(),
                    &checkpoint_label("search", "advance:after", &page_number),
                )
                .await;

                if progressed {
                    break;
                }
                session.stalled_advances += 1;
                warn!(
                    stalled = session.stalled_advances,
                    "advance left rows unchanged"
                );
                if session.stalled_advances >= NO_PROGRESS_LIMIT {
                    return Err(EngineError::NoProgress {
                        target: target.describe(),
                        pages_visited: session.pages_visited,
                        attempts: session.stalled_advances,
                    });
                }
            }
        }
    }
}

fn not_found(
    target: &SearchTarget,
    start: Instant,
    session: &SearchSession,
    reason: &str,
) -> EngineError {
    info!(pages_visited = session.pages_visited, reason, "row not found");
    EngineError::NotFound {
        target: target.describe(),
        waited_ms: start.elapsed().as_millis() as u64,
        pages_visited: Some(session.pages_visited),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{RowText, TypeAndSubmit};
    use crate::types::Pager;
    use std::time::Duration;
    use sureclick_driver_port::fake::{
        FakeDom, FakeElement, FakePager, RecordingHook, PAGER_FIRST, PAGER_NEXT, PAGER_ROWS,
    };

    fn names(count: usize) -> Vec<String> {
        (1..=count).map(|i| format!("user-{:02}", i)).collect()
    }

    fn pager() -> Pager {
        Pager::new(
            Locator::css(PAGER_ROWS),
            LocatorSet::single(Locator::css(PAGER_NEXT)),
        )
    }

    fn search(hook: Arc<RecordingHook>) -> DefaultPaginatedSearch {
        let policy = SearchPolicy {
            max_page_hops: 5,
            rerender_timeout_ms: 1_000,
            poll_interval_ms: 100,
        };
        DefaultPaginatedSearch::new(&policy, hook)
    }

    #[tokio::test(start_paused = true)]
    async fn match_on_current_page_needs_no_advance() {
        let dom = FakeDom::new();
        let handles = FakePager::new(names(6), 3).install(&dom);
        let hook = Arc::new(RecordingHook::new());
        let target = SearchTarget::new(RowText::exact("user-02"), pager());

        let hit = search(hook.clone())
            .find_across_pages(&dom, &target)
            .await
            .unwrap();
        assert_eq!(hit.pages_visited, 1);
        assert_eq!(dom.text(&hit.row).await.unwrap(), "user-02");
        assert_eq!(dom.click_count(&handles.next), 0);
        assert!(hook.labels().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn advances_until_found() {
        let dom = FakeDom::new();
        let handles = FakePager::new(names(15), 3).install(&dom);
        let hook = Arc::new(RecordingHook::new());
        let target = SearchTarget::new(RowText::exact("user-08"), pager());

        let hit = search(hook.clone())
            .find_across_pages(&dom, &target)
            .await
            .unwrap();
        assert_eq!(hit.pages_visited, 3);
        assert_eq!(dom.click_count(&handles.next), 2);
        assert_eq!(
            hook.labels(),
            vec![
                "search:advance:before:1",
                "search:advance:after:1",
                "search:advance:before:2",
                "search:advance:after:2",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn page_limit_stops_before_page_four() {
        let dom = FakeDom::new();
        FakePager::new(names(15), 3).install(&dom);
        let target = SearchTarget::new(RowText::exact("user-14"), pager()).with_max_page_hops(3);

        let err = search(Arc::new(RecordingHook::new()))
            .find_across_pages(&dom, &target)
            .await
            .unwrap_err();
        match err {
            EngineError::NotFound {
                pages_visited,
                reason,
                ..
            } => {
                assert_eq!(pages_visited, Some(3));
                assert_eq!(reason, "page limit reached");
            }
            other => panic!("unexpected error: {other}"),
        }
        // zero-based index 2 is the third page
        assert_eq!(dom.current_page(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_hops_inspects_only_current_page() {
        let dom = FakeDom::new();
        let handles = FakePager::new(names(6), 3).install(&dom);
        let target = SearchTarget::new(RowText::exact("user-05"), pager()).with_max_page_hops(0);

        let err = search(Arc::new(RecordingHook::new()))
            .find_across_pages(&dom, &target)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::NotFound {
                pages_visited: Some(1),
                ..
            }
        ));
        assert_eq!(dom.click_count(&handles.next), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_pager_fails_after_exactly_two_advances() {
        let dom = FakeDom::new();
        let handles = FakePager::new(names(9), 3).stuck().install(&dom);
        let target = SearchTarget::new(RowText::exact("user-09"), pager());

        let err = search(Arc::new(RecordingHook::new()))
            .find_across_pages(&dom, &target)
            .await
            .unwrap_err();
        match err {
            EngineError::NoProgress {
                pages_visited,
                attempts,
                ..
            } => {
                assert_eq!(pages_visited, 1);
                assert_eq!(attempts, NO_PROGRESS_LIMIT);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(dom.click_count(&handles.next), NO_PROGRESS_LIMIT);
    }

    #[tokio::test(start_paused = true)]
    async fn last_page_ends_with_not_found() {
        let dom = FakeDom::new();
        let handles = FakePager::new(names(5), 3).install(&dom);
        let target = SearchTarget::new(RowText::exact("nobody"), pager());

        let err = search(Arc::new(RecordingHook::new()))
            .find_across_pages(&dom, &target)
            .await
            .unwrap_err();
        match err {
            EngineError::NotFound {
                pages_visited,
                reason,
                ..
            } => {
                assert_eq!(pages_visited, Some(2));
                assert_eq!(reason, "last page reached");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(dom.click_count(&handles.next), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn filter_narrows_to_first_page() {
        let dom = FakeDom::new();
        let handles = FakePager::new(names(15), 3).with_search().install(&dom);
        let target = SearchTarget::new(RowText::exact("user-13"), pager())
            .with_filter(TypeAndSubmit::ant_design("user-13"));

        let hit = search(Arc::new(RecordingHook::new()))
            .find_across_pages(&dom, &target)
            .await
            .unwrap();
        assert_eq!(hit.pages_visited, 1);
        assert_eq!(dom.click_count(&handles.next), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_filter_falls_back_to_paging() {
        let dom = FakeDom::new();
        FakePager::new(names(9), 3).install(&dom);
        let target = SearchTarget::new(RowText::exact("user-07"), pager())
            .with_filter(TypeAndSubmit::ant_design("user-07"));

        let hit = search(Arc::new(RecordingHook::new()))
            .find_across_pages(&dom, &target)
            .await
            .unwrap();
        assert_eq!(hit.pages_visited, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn rewinds_to_first_page_when_asked() {
        let dom = FakeDom::new();
        let handles = FakePager::new(names(9), 3).install(&dom);
        dom.with_state(|state| state.advance_pager());
        dom.with_state(|state| state.advance_pager());
        assert_eq!(dom.current_page(), Some(2));

        let target = SearchTarget::new(
            RowText::exact("user-01"),
            pager().with_first_page(LocatorSet::single(Locator::css(PAGER_FIRST))),
        );
        let hit = search(Arc::new(RecordingHook::new()))
            .find_across_pages(&dom, &target)
            .await
            .unwrap();
        assert_eq!(hit.pages_visited, 1);
        assert_eq!(dom.click_count(&handles.first_page), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_hook_does_not_change_the_result() {
        let dom = FakeDom::new();
        FakePager::new(names(6), 3).install(&dom);
        let hook = Arc::new(RecordingHook::failing());
        let target = SearchTarget::new(RowText::exact("user-05"), pager());

        let hit = search(hook.clone())
            .find_across_pages(&dom, &target)
            .await
            .unwrap();
        assert_eq!(hit.pages_visited, 2);
        assert_eq!(hook.labels().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_filtered_rows_to_render() {
        let dom = FakeDom::new();
        dom.insert_css(PAGER_ROWS, FakeElement::new().text("user-01"));
        dom.insert_css(PAGER_NEXT, FakeElement::new().disabled());
        dom.insert_css(
            "#q",
            FakeElement::new().on_submit(|state| {
                state.detach_all(LocatorStrategy::Css, PAGER_ROWS);
                state.insert(
                    LocatorStrategy::Css,
                    PAGER_ROWS,
                    FakeElement::new()
                        .text("user-42")
                        .appears_after(Duration::from_millis(300)),
                );
            }),
        );
        let target = SearchTarget::new(RowText::exact("user-42"), pager()).with_filter(
            TypeAndSubmit::new(LocatorSet::single(Locator::css("#q")), "user-42"),
        );

        let started = Instant::now();
        let hit = search(Arc::new(RecordingHook::new()))
            .find_across_pages(&dom, &target)
            .await
            .unwrap();
        assert_eq!(hit.pages_visited, 1);
        assert_eq!(dom.text(&hit.row).await.unwrap(), "user-42");
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn filter_that_never_rerenders_still_searches() {
        let dom = FakeDom::new();
        dom.insert_css(PAGER_ROWS, FakeElement::new().text("user-01"));
        dom.insert_css(PAGER_NEXT, FakeElement::new().disabled());
        dom.insert_css("#q", FakeElement::new());
        let target = SearchTarget::new(RowText::exact("user-01"), pager()).with_filter(
            TypeAndSubmit::new(LocatorSet::single(Locator::css("#q")), "user-01"),
        );

        let started = Instant::now();
        let hit = search(Arc::new(RecordingHook::new()))
            .find_across_pages(&dom, &target)
            .await
            .unwrap();
        assert_eq!(hit.pages_visited, 1);
        assert!(started.elapsed() >= Duration::from_millis(1_000));
    }
}
