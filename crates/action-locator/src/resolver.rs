//! Element resolver with priority-ordered fallback

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sureclick_core_types::{DriverError, ElementRef, EngineError, Locator, LocatorSet};
use sureclick_driver_port::{checkpoint, checkpoint_label, Driver, EvidenceHook};
use sureclick_policy_center::ResolvePolicy;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument};

use crate::types::Resolution;

/// Element resolver trait
#[async_trait]
pub trait ElementResolver: Send + Sync {
    /// Resolve the set within `timeout`, trying candidates in priority order
    async fn resolve(
        &self,
        driver: &dyn Driver,
        set: &LocatorSet,
        timeout: Duration,
    ) -> Result<Resolution, EngineError>;
}

/// Default resolver.
///
/// Candidate `i` of `n` may be polled until `start + (i+1) * timeout / n`,
/// so the last candidate's window closes exactly at the overall deadline.
pub struct DefaultElementResolver {
    timeout: Duration,
    poll_interval: Duration,
    hook: Arc<dyn EvidenceHook>,
}

impl DefaultElementResolver {
    pub fn new(policy: &ResolvePolicy, hook: Arc<dyn EvidenceHook>) -> Self {
        Self {
            timeout: policy.timeout(),
            poll_interval: policy.poll_interval(),
            hook,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolve with the policy timeout.
    pub async fn resolve_default(
        &self,
        driver: &dyn Driver,
        set: &LocatorSet,
    ) -> Result<Resolution, EngineError> {
        self.resolve(driver, set, self.timeout).await
    }

    async fn probe(
        &self,
        driver: &dyn Driver,
        locator: &Locator,
    ) -> Result<Option<ElementRef>, DriverError> {
        let found = driver
            .find_elements(locator.strategy, &locator.selector)
            .await?;
        Ok(found.into_iter().next())
    }
}

#[async_trait]
impl ElementResolver for DefaultElementResolver {
    #[instrument(skip_all, fields(target = %set, timeout_ms = timeout.as_millis() as u64))]
    async fn resolve(
        &self,
        driver: &dyn Driver,
        set: &LocatorSet,
        timeout: Duration,
    ) -> Result<Resolution, EngineError> {
        let start = Instant::now();
        let count = set.len() as u32;
        let mut last_error: Option<DriverError> = None;

        for (index, locator) in set.candidates().iter().enumerate() {
            if index == 1 {
                checkpoint(
                    self.hook.as_ref(),
                    &checkpoint_label("resolve", "fallback", set.to_string()),
                )
                .await;
            }

            let window_end = start + timeout.saturating_mul(index as u32 + 1) / count;
            debug!(candidate = %locator, index, "trying locator");

            loop {
                match self.probe(driver, locator).await {
                    Ok(Some(element)) => {
                        let elapsed = start.elapsed();
                        info!(
                            candidate = %locator,
                            index,
                            elapsed_ms = elapsed.as_millis() as u64,
                            "element resolved"
                        );
                        return Ok(Resolution {
                            element,
                            locator: locator.clone(),
                            candidate_index: index,
                            elapsed,
                        });
                    }
                    Ok(None) => {}
                    Err(err) => {
                        debug!(candidate = %locator, error = %err, "lookup failed; treating as absent");
                        last_error = Some(err);
                    }
                }

                let now = Instant::now();
                if now >= window_end {
                    break;
                }
                sleep(self.poll_interval.min(window_end - now)).await;
            }
        }

        checkpoint(
            self.hook.as_ref(),
            &checkpoint_label("resolve", "exhausted", set.to_string()),
        )
        .await;

        let reason = match last_error {
            Some(err) => format!("no candidate matched; last driver error: {}", err),
            None => "no candidate matched".to_string(),
        };
        Err(EngineError::NotFound {
            target: set.to_string(),
            waited_ms: start.elapsed().as_millis() as u64,
            pages_visited: None,
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sureclick_core_types::LocatorStrategy;
    use sureclick_driver_port::fake::{FakeDom, FakeElement, RecordingHook};

    fn resolver(hook: Arc<RecordingHook>) -> DefaultElementResolver {
        let policy = ResolvePolicy {
            timeout_ms: 1_000,
            poll_interval_ms: 100,
        };
        DefaultElementResolver::new(&policy, hook)
    }

    fn two_candidates() -> LocatorSet {
        LocatorSet::single(Locator::css("#save")).or(Locator::xpath("//button[text()='Save']"))
    }

    #[tokio::test(start_paused = true)]
    async fn primary_wins_when_both_match() {
        let dom = FakeDom::new();
        let primary = dom.insert_css("#save", FakeElement::new());
        dom.insert(
            LocatorStrategy::XPath,
            "//button[text()='Save']",
            FakeElement::new(),
        );
        let resolver = resolver(Arc::new(RecordingHook::new()));

        for _ in 0..3 {
            let resolution = resolver
                .resolve(&dom, &two_candidates(), Duration::from_secs(1))
                .await
                .unwrap();
            assert_eq!(resolution.element, primary);
            assert_eq!(resolution.candidate_index, 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_used_after_primary_window() {
        let dom = FakeDom::new();
        let fallback = dom.insert(
            LocatorStrategy::XPath,
            "//button[text()='Save']",
            FakeElement::new(),
        );
        let hook = Arc::new(RecordingHook::new());
        let resolver = resolver(hook.clone());

        let resolution = resolver
            .resolve(&dom, &two_candidates(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(resolution.element, fallback);
        assert!(resolution.used_fallback());
        assert_eq!(resolution.elapsed, Duration::from_millis(500));
        assert_eq!(hook.count_prefix("resolve:fallback:"), 1);
        assert_eq!(hook.count_prefix("resolve:exhausted:"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn late_element_is_picked_up_by_polling() {
        let dom = FakeDom::new();
        let late = dom.insert_css(
            "#save",
            FakeElement::new().appears_after(Duration::from_millis(300)),
        );
        let resolver = resolver(Arc::new(RecordingHook::new()));

        let resolution = resolver
            .resolve(&dom, &two_candidates(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(resolution.element, late);
        assert_eq!(resolution.elapsed, Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_honors_timeout() {
        let dom = FakeDom::new();
        let hook = Arc::new(RecordingHook::new());
        let resolver = resolver(hook.clone());
        let started = Instant::now();

        let err = resolver
            .resolve(&dom, &two_candidates(), Duration::from_secs(1))
            .await
            .unwrap_err();
        let waited = started.elapsed();

        assert!(waited >= Duration::from_millis(1_000));
        assert!(waited <= Duration::from_millis(1_100));
        match err {
            EngineError::NotFound {
                target, waited_ms, ..
            } => {
                assert!(target.contains("css=#save"));
                assert_eq!(waited_ms, 1_000);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(hook.count_prefix("resolve:exhausted:"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_polls_each_candidate_once() {
        let dom = FakeDom::new();
        let resolver = resolver(Arc::new(RecordingHook::new()));

        let result = resolver
            .resolve(&dom, &two_candidates(), Duration::ZERO)
            .await;
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
        assert_eq!(dom.find_calls(), 2);
    }
}
