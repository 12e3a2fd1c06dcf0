//! Engine facade wiring the components to one policy

use std::sync::Arc;
use std::time::Duration;

use action_gate::{Condition, DefaultReadinessGate, GateOutcome, ReadinessGate, ReadinessSpec};
use action_locator::{DefaultElementResolver, ElementResolver, Resolution};
use action_paginate::{DefaultPaginatedSearch, PaginatedSearch, SearchHit, SearchTarget};
use action_primitives::{ActionExecutor, ActionReport, ActionSpec, DefaultActionExecutor};
use sureclick_core_types::{EngineError, LocatorSet};
use sureclick_driver_port::{noop_hook, Driver, EvidenceHook};
use sureclick_policy_center::EnginePolicy;

/// Resolution and synchronization engine.
///
/// Components share the evidence hook; none of them keeps state between
/// calls, so one engine can serve several drivers concurrently.
pub struct Engine {
    policy: EnginePolicy,
    resolver: DefaultElementResolver,
    gate: DefaultReadinessGate,
    search: DefaultPaginatedSearch,
    executor: DefaultActionExecutor,
}

impl Engine {
    pub fn new(policy: EnginePolicy, hook: Arc<dyn EvidenceHook>) -> Self {
        Self {
            resolver: DefaultElementResolver::new(&policy.resolve, Arc::clone(&hook)),
            gate: DefaultReadinessGate::new(),
            search: DefaultPaginatedSearch::new(&policy.search, Arc::clone(&hook)),
            executor: DefaultActionExecutor::new(&policy.action, hook),
            policy,
        }
    }

    /// Built-in policy, no evidence.
    pub fn with_defaults() -> Self {
        Self::new(EnginePolicy::default(), noop_hook())
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    /// First live element of `set`; `None` uses the policy timeout.
    pub async fn resolve(
        &self,
        driver: &dyn Driver,
        set: &LocatorSet,
        timeout: Option<Duration>,
    ) -> Result<Resolution, EngineError> {
        let timeout = timeout.unwrap_or_else(|| self.resolver.default_timeout());
        self.resolver.resolve(driver, set, timeout).await
    }

    /// ANY spec with the policy's readiness timing.
    pub fn any(&self, conditions: Vec<Condition>) -> Result<ReadinessSpec, EngineError> {
        ReadinessSpec::any(conditions, &self.policy.readiness)
    }

    /// ALL spec with the policy's readiness timing.
    pub fn all(&self, conditions: Vec<Condition>) -> Result<ReadinessSpec, EngineError> {
        ReadinessSpec::all(conditions, &self.policy.readiness)
    }

    pub async fn await_ready(
        &self,
        driver: &dyn Driver,
        spec: &ReadinessSpec,
    ) -> Result<GateOutcome, EngineError> {
        self.gate.await_ready(driver, spec).await
    }

    pub async fn settle(
        &self,
        driver: &dyn Driver,
        spec: &ReadinessSpec,
    ) -> Result<GateOutcome, EngineError> {
        self.gate.settle(driver, spec).await
    }

    pub async fn find_across_pages(
        &self,
        driver: &dyn Driver,
        target: &SearchTarget,
    ) -> Result<SearchHit, EngineError> {
        self.search.find_across_pages(driver, target).await
    }

    pub async fn perform(
        &self,
        driver: &dyn Driver,
        spec: &ActionSpec,
    ) -> Result<ActionReport, EngineError> {
        self.executor.perform(driver, spec).await
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sureclick_core_types::Locator;
    use sureclick_driver_port::fake::{FakeDom, FakeElement};
    use tokio::time::Instant;

    fn fast_policy() -> EnginePolicy {
        let mut policy = EnginePolicy::default();
        policy.resolve.timeout_ms = 600;
        policy.readiness.timeout_ms = 400;
        policy
    }

    #[tokio::test(start_paused = true)]
    async fn resolve_uses_policy_timeout_unless_overridden() {
        let dom = FakeDom::new();
        let engine = Engine::new(fast_policy(), noop_hook());
        let set = LocatorSet::single(Locator::css("#missing"));

        let started = Instant::now();
        assert!(engine.resolve(&dom, &set, None).await.is_err());
        assert_eq!(started.elapsed(), Duration::from_millis(600));

        let started = Instant::now();
        assert!(engine
            .resolve(&dom, &set, Some(Duration::from_millis(200)))
            .await
            .is_err());
        assert_eq!(started.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn readiness_helpers_take_policy_timing() {
        let dom = FakeDom::new();
        dom.insert_css("#grid", FakeElement::new());
        let engine = Engine::new(fast_policy(), noop_hook());

        let spec = engine
            .all(vec![Condition::visible(Locator::css("#grid"))])
            .unwrap();
        assert_eq!(spec.timeout(), Duration::from_millis(400));
        assert!(engine.await_ready(&dom, &spec).await.is_ok());
        assert!(engine.any(Vec::new()).is_err());
    }
}
