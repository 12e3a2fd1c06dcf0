//! Readiness gate polling loop

use async_trait::async_trait;
use sureclick_core_types::EngineError;
use sureclick_driver_port::Driver;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument};

use crate::types::{GateOutcome, ReadinessSpec};

/// Readiness gate trait
#[async_trait]
pub trait ReadinessGate: Send + Sync {
    /// Wait until the spec's mode is satisfied on one tick
    async fn await_ready(
        &self,
        driver: &dyn Driver,
        spec: &ReadinessSpec,
    ) -> Result<GateOutcome, EngineError>;

    /// Like `await_ready`, but the satisfied state must hold on the next
    /// tick too
    async fn settle(
        &self,
        driver: &dyn Driver,
        spec: &ReadinessSpec,
    ) -> Result<GateOutcome, EngineError>;
}

/// Default gate implementation
#[derive(Debug, Clone, Default)]
pub struct DefaultReadinessGate;

struct Tick {
    satisfied: Vec<String>,
    pending: Vec<String>,
    ok: bool,
}

impl DefaultReadinessGate {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate every condition once; a driver error counts as false.
    async fn tick(&self, driver: &dyn Driver, spec: &ReadinessSpec) -> Tick {
        let mut results = Vec::with_capacity(spec.conditions().len());
        let mut satisfied = Vec::new();
        let mut pending = Vec::new();
        for condition in spec.conditions() {
            let ok = match condition.evaluate(driver).await {
                Ok(ok) => ok,
                Err(err) => {
                    debug!(condition = %condition, error = %err, "condition errored; treating as false");
                    false
                }
            };
            if ok {
                satisfied.push(condition.name().to_string());
            } else {
                pending.push(condition.name().to_string());
            }
            results.push(ok);
        }
        Tick {
            ok: spec.mode().is_satisfied(&results),
            satisfied,
            pending,
        }
    }

    async fn run(
        &self,
        driver: &dyn Driver,
        spec: &ReadinessSpec,
        confirm: bool,
    ) -> Result<GateOutcome, EngineError> {
        let start = Instant::now();
        let deadline = start + spec.timeout();
        let mut ticks = 0u32;

        loop {
            ticks += 1;
            let mut tick = self.tick(driver, spec).await;

            if tick.ok && confirm {
                let remaining = deadline.saturating_duration_since(Instant::now());
                sleep(spec.poll_interval().min(remaining)).await;
                ticks += 1;
                let confirmation = self.tick(driver, spec).await;
                if !confirmation.ok {
                    debug!(ticks, "state did not hold for the confirmation tick");
                }
                tick = confirmation;
            }

            if tick.ok {
                let elapsed = start.elapsed();
                info!(
                    satisfied = ?tick.satisfied,
                    ticks,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "readiness satisfied"
                );
                return Ok(GateOutcome {
                    satisfied: tick.satisfied,
                    ticks,
                    elapsed,
                });
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(EngineError::Timeout {
                    spec: spec.to_string(),
                    waited_ms: start.elapsed().as_millis() as u64,
                    pending: tick.pending,
                });
            }
            sleep(spec.poll_interval().min(deadline - now)).await;
        }
    }
}

#[async_trait]
impl ReadinessGate for DefaultReadinessGate {
    #[instrument(skip_all, fields(spec = %spec))]
    async fn await_ready(
        &self,
        driver: &dyn Driver,
        spec: &ReadinessSpec,
    ) -> Result<GateOutcome, EngineError> {
        self.run(driver, spec, false).await
    }

    #[instrument(skip_all, fields(spec = %spec))]
    async fn settle(
        &self,
        driver: &dyn Driver,
        spec: &ReadinessSpec,
    ) -> Result<GateOutcome, EngineError> {
        self.run(driver, spec, true).await
    }
}
