//! Core data types for the action executor

use std::fmt;

use action_gate::{Condition, GateOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sureclick_core_types::{ElementRef, LocatorSet};

/// A single interaction with an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    /// Native driver click
    Click,

    /// `element.click()` through script; ignores overlays
    ScriptClick,

    /// Native keystrokes, optionally clearing the field first
    Type { text: String, clear: bool },

    /// Assign the value through script and fire input/change events
    ScriptType { text: String },
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::Click => "click",
            Op::ScriptClick => "script_click",
            Op::Type { .. } => "type",
            Op::ScriptType { .. } => "script_type",
        }
    }
}

/// What the action operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Resolved on every attempt; stale handles are replaced
    Located(LocatorSet),

    /// Caller-supplied handle; cannot be re-resolved
    Element(ElementRef),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Located(set) => write!(f, "{}", set),
            Target::Element(element) => write!(f, "{}", element),
        }
    }
}

impl From<LocatorSet> for Target {
    fn from(set: LocatorSet) -> Self {
        Target::Located(set)
    }
}

impl From<ElementRef> for Target {
    fn from(element: ElementRef) -> Self {
        Target::Element(element)
    }
}

/// Declarative description of one interaction
#[derive(Debug, Clone)]
pub struct ActionSpec {
    pub target: Target,
    pub primary: Op,
    pub fallback: Op,
    /// Must hold after the operation for the action to count as done
    pub post_condition: Condition,
    /// Stale re-resolutions allowed; `None` uses the policy value
    pub retries: Option<u32>,
}

impl ActionSpec {
    pub fn new(
        target: impl Into<Target>,
        primary: Op,
        fallback: Op,
        post_condition: Condition,
    ) -> Self {
        Self {
            target: target.into(),
            primary,
            fallback,
            post_condition,
            retries: None,
        }
    }

    /// Native click, script click when obscured.
    pub fn click(target: impl Into<Target>, post_condition: Condition) -> Self {
        Self::new(target, Op::Click, Op::ScriptClick, post_condition)
    }

    /// Clear and type, script assignment when the field rejects keys.
    pub fn type_text(
        target: impl Into<Target>,
        text: impl Into<String>,
        post_condition: Condition,
    ) -> Self {
        let text = text.into();
        Self::new(
            target,
            Op::Type {
                text: text.clone(),
                clear: true,
            },
            Op::ScriptType { text },
            post_condition,
        )
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }
}

/// Which operation produced the effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionMethod {
    Primary,
    Fallback,
}

/// Report of a completed action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionReport {
    /// Correlates log lines and evidence of one action
    pub action_id: String,

    pub method: ActionMethod,

    /// Stale re-resolutions consumed
    pub stale_retries: u32,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub finished_at: DateTime<Utc>,

    pub latency_ms: u64,

    /// How the post-condition was confirmed
    pub post_condition: GateOutcome,
}
