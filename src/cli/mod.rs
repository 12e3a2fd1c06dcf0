pub mod output;
pub mod policy;
pub mod probe;

pub use output::OutputFormat;
pub use policy::{cmd_policy, PolicyArgs};
pub use probe::{cmd_probe, ProbeArgs};
