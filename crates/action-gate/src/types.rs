//! Core types for the readiness gate

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sureclick_core_types::EngineError;
use sureclick_policy_center::ReadinessPolicy;

use crate::conditions::Condition;

/// How the conditions of a spec combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// One condition true on a tick is enough
    Any,
    /// Every condition true on the same tick
    All,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Any => "ANY",
            Mode::All => "ALL",
        }
    }

    pub fn is_satisfied(&self, results: &[bool]) -> bool {
        match self {
            Mode::Any => results.iter().any(|ok| *ok),
            Mode::All => results.iter().all(|ok| *ok),
        }
    }
}

/// Bounded wait over a set of conditions.
///
/// Construction enforces a non-empty condition list and positive timeout
/// and poll interval.
#[derive(Debug, Clone)]
pub struct ReadinessSpec {
    mode: Mode,
    conditions: Vec<Condition>,
    timeout: Duration,
    poll_interval: Duration,
}

impl ReadinessSpec {
    pub fn new(
        mode: Mode,
        conditions: Vec<Condition>,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Self, EngineError> {
        if conditions.is_empty() {
            return Err(EngineError::InvalidSpec(
                "readiness spec needs at least one condition".into(),
            ));
        }
        if timeout.is_zero() {
            return Err(EngineError::InvalidSpec(
                "readiness timeout must be greater than 0".into(),
            ));
        }
        if poll_interval.is_zero() {
            return Err(EngineError::InvalidSpec(
                "readiness poll interval must be greater than 0".into(),
            ));
        }
        Ok(Self {
            mode,
            conditions,
            timeout,
            poll_interval,
        })
    }

    pub fn any(conditions: Vec<Condition>, policy: &ReadinessPolicy) -> Result<Self, EngineError> {
        Self::new(Mode::Any, conditions, policy.timeout(), policy.poll_interval())
    }

    pub fn all(conditions: Vec<Condition>, policy: &ReadinessPolicy) -> Result<Self, EngineError> {
        Self::new(Mode::All, conditions, policy.timeout(), policy.poll_interval())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, EngineError> {
        if timeout.is_zero() {
            return Err(EngineError::InvalidSpec(
                "readiness timeout must be greater than 0".into(),
            ));
        }
        self.timeout = timeout;
        Ok(self)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl fmt::Display for ReadinessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.conditions.iter().map(|c| c.name()).collect();
        write!(f, "{}[{}]", self.mode.name(), names.join(", "))
    }
}

/// Result of a satisfied gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateOutcome {
    /// Names of the conditions true on the deciding tick, in declaration order
    pub satisfied: Vec<String>,

    /// Evaluation rounds performed
    pub ticks: u32,

    pub elapsed: Duration,
}

impl GateOutcome {
    pub fn is_satisfied(&self, name: &str) -> bool {
        self.satisfied.iter().any(|s| s == name)
    }
}
