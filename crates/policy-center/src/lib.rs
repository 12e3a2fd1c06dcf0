//! Engine policy for the sureclick components
//!
//! Every timing constant the engine uses (timeouts, poll intervals, retry
//! and page bounds) lives in one `EnginePolicy`, loaded from built-in
//! defaults, YAML files and `SURECLICK_POLICY__*` environment overlays.

pub mod defaults;
pub mod errors;
pub mod loader;
pub mod model;

pub use defaults::default_policy;
pub use errors::PolicyError;
pub use loader::{load_policy, load_policy_with_options, LoadOptions};
pub use model::{
    ActionPolicy, EnginePolicy, PolicySource, ReadinessPolicy, ResolvePolicy, SearchPolicy,
};
