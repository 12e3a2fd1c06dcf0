//! Sureclick - resilient element resolution and synchronization
//!
//! The `Engine` bundles the four engine components behind one policy and one
//! evidence hook:
//! - `resolve`: first live element of a `LocatorSet`
//! - `await_ready` / `settle`: bounded ANY/ALL waits over DOM conditions
//! - `find_across_pages`: bounded, progress-checked row search in a pager
//! - `perform`: click/type with fallback, stale recovery and a post-condition
//!
//! Every operation takes the driver explicitly; the engine holds no session.

pub mod engine;

pub use engine::Engine;

pub use action_gate::{Condition, DomPredicate, GateOutcome, Mode, ReadinessSpec};
pub use action_locator::Resolution;
pub use action_paginate::{
    FilterAction, Pager, RowPredicate, RowText, SearchHit, SearchTarget, TypeAndSubmit,
};
pub use action_primitives::{ActionMethod, ActionReport, ActionSpec, Op, Target};
pub use sureclick_core_types::{
    DriverError, DriverErrorKind, ElementRef, EngineError, Locator, LocatorSet, LocatorStrategy,
};
pub use sureclick_driver_port::{noop_hook, Driver, EvidenceHook, HookError, NoopHook, ScriptArg};
pub use sureclick_policy_center::{load_policy, EnginePolicy, PolicySource};
