use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::defaults::default_policy;
use crate::errors::PolicyError;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EnginePolicy {
    pub resolve: ResolvePolicy,
    pub readiness: ReadinessPolicy,
    pub search: SearchPolicy,
    pub action: ActionPolicy,
    /// Which layer last set each field path
    #[serde(skip)]
    pub provenance: BTreeMap<String, PolicySource>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvePolicy {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchPolicy {
    /// Pages inspected per search, the starting page included
    pub max_page_hops: u32,
    pub rerender_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionPolicy {
    pub stale_retries: u32,
    pub resolve_timeout_ms: u64,
    pub post_condition_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub scroll_into_view: bool,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PolicySource {
    Builtin,
    File,
    Env,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        default_policy()
    }
}

impl ResolvePolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl ReadinessPolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl SearchPolicy {
    pub fn rerender_timeout(&self) -> Duration {
        Duration::from_millis(self.rerender_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl ActionPolicy {
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    pub fn post_condition_timeout(&self) -> Duration {
        Duration::from_millis(self.post_condition_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl EnginePolicy {
    pub fn set_provenance(&mut self, path: &str, source: PolicySource) {
        self.provenance.insert(path.to_string(), source);
    }

    pub fn source_of(&self, path: &str) -> Option<PolicySource> {
        self.provenance.get(path).copied()
    }

    /// Set one field by dotted path, e.g. `search.max_page_hops`.
    pub fn apply(
        &mut self,
        path: &str,
        value: &Value,
        source: PolicySource,
    ) -> Result<(), PolicyError> {
        match path {
            "resolve.timeout_ms" => self.resolve.timeout_ms = to_u64(path, value)?,
            "resolve.poll_interval_ms" => self.resolve.poll_interval_ms = to_u64(path, value)?,
            "readiness.timeout_ms" => self.readiness.timeout_ms = to_u64(path, value)?,
            "readiness.poll_interval_ms" => self.readiness.poll_interval_ms = to_u64(path, value)?,
            "search.max_page_hops" => self.search.max_page_hops = to_u32(path, value)?,
            "search.rerender_timeout_ms" => self.search.rerender_timeout_ms = to_u64(path, value)?,
            "search.poll_interval_ms" => self.search.poll_interval_ms = to_u64(path, value)?,
            "action.stale_retries" => self.action.stale_retries = to_u32(path, value)?,
            "action.resolve_timeout_ms" => self.action.resolve_timeout_ms = to_u64(path, value)?,
            "action.post_condition_timeout_ms" => {
                self.action.post_condition_timeout_ms = to_u64(path, value)?
            }
            "action.poll_interval_ms" => self.action.poll_interval_ms = to_u64(path, value)?,
            "action.scroll_into_view" => self.action.scroll_into_view = to_bool(path, value)?,
            path => return Err(PolicyError::UnsupportedPath(path.to_string())),
        }
        self.set_provenance(path, source);
        Ok(())
    }

    /// Every timeout and poll interval must be positive.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let durations = [
            ("resolve.timeout_ms", self.resolve.timeout_ms),
            ("resolve.poll_interval_ms", self.resolve.poll_interval_ms),
            ("readiness.timeout_ms", self.readiness.timeout_ms),
            ("readiness.poll_interval_ms", self.readiness.poll_interval_ms),
            ("search.rerender_timeout_ms", self.search.rerender_timeout_ms),
            ("search.poll_interval_ms", self.search.poll_interval_ms),
            ("action.resolve_timeout_ms", self.action.resolve_timeout_ms),
            (
                "action.post_condition_timeout_ms",
                self.action.post_condition_timeout_ms,
            ),
            ("action.poll_interval_ms", self.action.poll_interval_ms),
        ];
        for (path, value) in durations {
            if value == 0 {
                return Err(PolicyError::ZeroDuration(path.to_string()));
            }
        }
        Ok(())
    }
}

fn invalid(path: &str, reason: String) -> PolicyError {
    PolicyError::InvalidValue {
        path: path.to_string(),
        reason,
    }
}

fn to_u64(path: &str, value: &Value) -> Result<u64, PolicyError> {
    value
        .as_u64()
        .ok_or_else(|| invalid(path, format!("expected unsigned integer, got {value}")))
}

fn to_u32(path: &str, value: &Value) -> Result<u32, PolicyError> {
    let wide = to_u64(path, value)?;
    u32::try_from(wide).map_err(|_| invalid(path, format!("{wide} exceeds u32")))
}

fn to_bool(path: &str, value: &Value) -> Result<bool, PolicyError> {
    value
        .as_bool()
        .ok_or_else(|| invalid(path, format!("expected bool, got {value}")))
}
