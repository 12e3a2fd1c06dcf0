//! Action executor with fallback, stale recovery and post-condition check

use std::sync::Arc;

use action_gate::{DefaultReadinessGate, GateOutcome, Mode, ReadinessGate, ReadinessSpec};
use action_locator::{DefaultElementResolver, ElementResolver};
use async_trait::async_trait;
use chrono::Utc;
use sureclick_core_types::{ActionId, DriverError, ElementRef, EngineError};
use sureclick_driver_port::scripts::{
    SCRIPT_CLICK, SCRIPT_DISPATCH_INPUT, SCRIPT_SCROLL_INTO_VIEW, SCRIPT_SET_VALUE,
};
use sureclick_driver_port::{checkpoint, checkpoint_label, Driver, EvidenceHook, ScriptArg};
use sureclick_policy_center::{ActionPolicy, ResolvePolicy};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::types::{ActionMethod, ActionReport, ActionSpec, Op, Target};

/// Action executor trait
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Perform the action and confirm its post-condition
    async fn perform(
        &self,
        driver: &dyn Driver,
        spec: &ActionSpec,
    ) -> Result<ActionReport, EngineError>;
}

/// Default executor implementation
pub struct DefaultActionExecutor {
    policy: ActionPolicy,
    resolver: DefaultElementResolver,
    gate: DefaultReadinessGate,
    hook: Arc<dyn EvidenceHook>,
}

/// Why one attempt on a resolved element did not complete
enum AttemptError {
    /// Element detached; worth re-resolving
    Stale(DriverError),
    Failed(EngineError),
}

impl DefaultActionExecutor {
    pub fn new(policy: &ActionPolicy, hook: Arc<dyn EvidenceHook>) -> Self {
        let resolve = ResolvePolicy {
            timeout_ms: policy.resolve_timeout_ms,
            poll_interval_ms: policy.poll_interval_ms,
        };
        Self {
            policy: policy.clone(),
            resolver: DefaultElementResolver::new(&resolve, Arc::clone(&hook)),
            gate: DefaultReadinessGate::new(),
            hook,
        }
    }

    async fn acquire(&self, driver: &dyn Driver, target: &Target) -> Result<ElementRef, EngineError> {
        match target {
            Target::Located(set) => Ok(self.resolver.resolve_default(driver, set).await?.element),
            Target::Element(element) => Ok(element.clone()),
        }
    }

    async fn apply(&self, driver: &dyn Driver, element: &ElementRef, op: &Op) -> Result<(), DriverError> {
        match op {
            Op::Click => driver.click(element).await,
            Op::ScriptClick => driver
                .execute_script(SCRIPT_CLICK, vec![ScriptArg::Element(element.clone())])
                .await
                .map(|_| ()),
            Op::Type { text, clear } => {
                if *clear {
                    driver.clear(element).await?;
                }
                driver.send_keys(element, text).await?;
                if let Err(err) = driver
                    .execute_script(SCRIPT_DISPATCH_INPUT, vec![ScriptArg::Element(element.clone())])
                    .await
                {
                    debug!(error = %err, "input event dispatch failed");
                }
                Ok(())
            }
            Op::ScriptType { text } => driver
                .execute_script(
                    SCRIPT_SET_VALUE,
                    vec![ScriptArg::Element(element.clone()), ScriptArg::from(text.as_str())],
                )
                .await
                .map(|_| ()),
        }
    }

    /// One primary-then-fallback attempt on a resolved element.
    async fn attempt(
        &self,
        driver: &dyn Driver,
        element: &ElementRef,
        spec: &ActionSpec,
    ) -> Result<ActionMethod, AttemptError> {
        if self.policy.scroll_into_view {
            if let Err(err) = driver
                .execute_script(SCRIPT_SCROLL_INTO_VIEW, vec![ScriptArg::Element(element.clone())])
                .await
            {
                if err.is_stale() {
                    return Err(AttemptError::Stale(err));
                }
                debug!(error = %err, "scroll into view failed; continuing");
            }
        }

        let primary_err = match self.apply(driver, element, &spec.primary).await {
            Ok(()) => return Ok(ActionMethod::Primary),
            Err(err) if err.is_stale() => return Err(AttemptError::Stale(err)),
            Err(err) if err.is_obscured() => err,
            Err(err) => return Err(AttemptError::Failed(EngineError::Driver(err))),
        };

        debug!(
            primary = spec.primary.name(),
            fallback = spec.fallback.name(),
            error = %primary_err,
            "primary obscured; using fallback"
        );
        match self.apply(driver, element, &spec.fallback).await {
            Ok(()) => Ok(ActionMethod::Fallback),
            Err(err) if err.is_stale() => Err(AttemptError::Stale(err)),
            Err(err) => Err(AttemptError::Failed(EngineError::ActionFailed {
                target: spec.target.to_string(),
                op: spec.primary.name().to_string(),
                reason: format!(
                    "primary failed ({}); fallback {} failed ({})",
                    primary_err,
                    spec.fallback.name(),
                    err
                ),
            })),
        }
    }

    async fn verify(&self, driver: &dyn Driver, spec: &ActionSpec) -> Result<GateOutcome, EngineError> {
        let gate_spec = ReadinessSpec::new(
            Mode::Any,
            vec![spec.post_condition.clone()],
            self.policy.post_condition_timeout(),
            self.policy.poll_interval(),
        )?;
        match self.gate.await_ready(driver, &gate_spec).await {
            Ok(outcome) => Ok(outcome),
            Err(EngineError::Timeout { waited_ms, .. }) => Err(EngineError::ActionFailed {
                target: spec.target.to_string(),
                op: spec.primary.name().to_string(),
                reason: format!(
                    "post-condition '{}' did not hold within {}ms",
                    spec.post_condition, waited_ms
                ),
            }),
            Err(err) => Err(err),
        }
    }

    async fn run(
        &self,
        driver: &dyn Driver,
        spec: &ActionSpec,
        action_id: &ActionId,
    ) -> Result<ActionReport, EngineError> {
        let started_at = Utc::now();
        let start = Instant::now();
        let retries = spec.retries.unwrap_or(self.policy.stale_retries);
        let mut stale_retries = 0u32;
        let mut element = self.acquire(driver, &spec.target).await?;

        let method = loop {
            match self.attempt(driver, &element, spec).await {
                Ok(method) => break method,
                Err(AttemptError::Failed(err)) => return Err(err),
                Err(AttemptError::Stale(err)) => {
                    let Target::Located(set) = &spec.target else {
                        return Err(EngineError::StaleReference {
                            target: spec.target.to_string(),
                            attempts: 0,
                        });
                    };
                    if stale_retries >= retries {
                        return Err(EngineError::StaleReference {
                            target: spec.target.to_string(),
                            attempts: stale_retries,
                        });
                    }
                    stale_retries += 1;
                    debug!(
                        action_id = %action_id,
                        attempt = stale_retries,
                        error = %err,
                        "element went stale; re-resolving"
                    );
                    element = self.resolver.resolve_default(driver, set).await?.element;
                }
            }
        };

        let post_condition = self.verify(driver, spec).await?;
        Ok(ActionReport {
            action_id: action_id.to_string(),
            method,
            stale_retries,
            started_at,
            finished_at: Utc::now(),
            latency_ms: start.elapsed().as_millis() as u64,
            post_condition,
        })
    }
}

#[async_trait]
impl ActionExecutor for DefaultActionExecutor {
    #[instrument(skip_all, fields(target = %spec.target, op = spec.primary.name()))]
    async fn perform(
        &self,
        driver: &dyn Driver,
        spec: &ActionSpec,
    ) -> Result<ActionReport, EngineError> {
        let action_id = ActionId::new();
        info!(action_id = %action_id, "performing action");

        let result = self.run(driver, spec, &action_id).await;
        let target = spec.target.to_string();
        match &result {
            Ok(report) => {
                info!(
                    action_id = %action_id,
                    method = ?report.method,
                    stale_retries = report.stale_retries,
                    latency_ms = report.latency_ms,
                    "action completed"
                );
                checkpoint(
                    self.hook.as_ref(),
                    &checkpoint_label("action", "success", &target),
                )
                .await;
            }
            Err(err) => {
                warn!(action_id = %action_id, error = %err, "action failed");
                checkpoint(
                    self.hook.as_ref(),
                    &checkpoint_label("action", "failure", &target),
                )
                .await;
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use action_gate::Condition;
    use std::time::Duration;
    use sureclick_core_types::{Locator, LocatorSet};
    use sureclick_driver_port::fake::{FakeDom, FakeElement, RecordingHook};

    fn executor(hook: Arc<RecordingHook>) -> DefaultActionExecutor {
        let policy = ActionPolicy {
            stale_retries: 2,
            resolve_timeout_ms: 1_000,
            post_condition_timeout_ms: 1_000,
            poll_interval_ms: 100,
            scroll_into_view: true,
        };
        DefaultActionExecutor::new(&policy, hook)
    }

    fn save_button() -> LocatorSet {
        LocatorSet::single(Locator::css("#save"))
    }

    fn navigates() -> FakeElement {
        FakeElement::new().on_click(|state| state.set_url("https://app.local/#/saved"))
    }

    #[tokio::test(start_paused = true)]
    async fn primary_click_with_post_condition() {
        let dom = FakeDom::new();
        dom.insert_css("#save", navigates());
        let hook = Arc::new(RecordingHook::new());

        let report = executor(hook.clone())
            .perform(
                &dom,
                &ActionSpec::click(save_button(), Condition::url_contains("/saved")),
            )
            .await
            .unwrap();
        assert_eq!(report.method, ActionMethod::Primary);
        assert_eq!(report.stale_retries, 0);
        assert_eq!(hook.labels(), vec!["action:success:[css=#save]"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_element_is_re_resolved_once() {
        let dom = FakeDom::new();
        dom.insert_css("#save", navigates().detach_on_first_use());

        let report = executor(Arc::new(RecordingHook::new()))
            .perform(
                &dom,
                &ActionSpec::click(save_button(), Condition::url_contains("/saved")),
            )
            .await
            .unwrap();
        assert_eq!(report.stale_retries, 1);
        assert_eq!(report.method, ActionMethod::Primary);
    }

    #[tokio::test(start_paused = true)]
    async fn obscured_click_falls_back_to_script() {
        let dom = FakeDom::new();
        let button = dom.insert_css("#save", navigates().intercepted());

        let report = executor(Arc::new(RecordingHook::new()))
            .perform(
                &dom,
                &ActionSpec::click(save_button(), Condition::url_contains("/saved")),
            )
            .await
            .unwrap();
        assert_eq!(report.method, ActionMethod::Fallback);
        assert_eq!(dom.click_count(&button), 1);
        assert!(dom.scripts_run().iter().any(|s| s == SCRIPT_CLICK));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_effect_fails_despite_successful_click() {
        let dom = FakeDom::new();
        let button = dom.insert_css("#save", FakeElement::new());
        let hook = Arc::new(RecordingHook::new());
        let started = Instant::now();

        let err = executor(hook.clone())
            .perform(
                &dom,
                &ActionSpec::click(save_button(), Condition::url_contains("/saved")),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ActionFailed { .. }));
        assert!(err.to_string().contains("url_contains(/saved)"));
        assert_eq!(dom.click_count(&button), 1);
        assert_eq!(started.elapsed(), Duration::from_secs(1));
        assert_eq!(hook.labels(), vec!["action:failure:[css=#save]"]);
    }

    #[tokio::test(start_paused = true)]
    async fn both_operations_failing_is_action_failed() {
        let dom = FakeDom::new();
        let field = dom.insert_css("#name", FakeElement::new().not_interactable());
        let spec = ActionSpec::new(
            field,
            Op::Click,
            Op::Type {
                text: "x".into(),
                clear: false,
            },
            Condition::present(Locator::css("#name")),
        );

        let err = executor(Arc::new(RecordingHook::new()))
            .perform(&dom, &spec)
            .await
            .unwrap_err();
        match err {
            EngineError::ActionFailed { op, reason, .. } => {
                assert_eq!(op, "click");
                assert!(reason.contains("fallback type failed"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn bare_element_cannot_recover_from_staleness() {
        let dom = FakeDom::new();
        let button = dom.insert_css("#save", navigates());
        dom.replace(&button);

        let err = executor(Arc::new(RecordingHook::new()))
            .perform(
                &dom,
                &ActionSpec::click(button, Condition::url_contains("/saved")),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::StaleReference { attempts: 0, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_bound_stale_recovery() {
        let dom = FakeDom::new();
        dom.insert_css("#save", navigates().detach_on_first_use());

        let err = executor(Arc::new(RecordingHook::new()))
            .perform(
                &dom,
                &ActionSpec::click(save_button(), Condition::url_contains("/saved")).with_retries(0),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::StaleReference { attempts: 0, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_keys_fall_back_to_script_assignment() {
        let dom = FakeDom::new();
        let input = dom.insert_css("#email", FakeElement::new().not_interactable());
        let spec = ActionSpec::type_text(
            LocatorSet::single(Locator::css("#email")),
            "ana@x.io",
            Condition::attribute_equals(Locator::css("#email"), "value", "ana@x.io"),
        );

        let report = executor(Arc::new(RecordingHook::new()))
            .perform(&dom, &spec)
            .await
            .unwrap();
        assert_eq!(report.method, ActionMethod::Fallback);
        assert_eq!(dom.value_of(&input).as_deref(), Some("ana@x.io"));
    }
}
