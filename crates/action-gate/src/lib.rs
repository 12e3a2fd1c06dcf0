//! Readiness gate - composite waits over DOM conditions
//!
//! A `ReadinessSpec` combines named `Condition`s in ANY or ALL mode under a
//! timeout. The gate evaluates every condition on each poll tick and
//! succeeds when the mode is satisfied on that single tick; `settle`
//! additionally confirms the state on the following tick.

pub mod conditions;
pub mod gate;
pub mod types;

pub use conditions::*;
pub use gate::*;
pub use types::*;
