//! Driver port - the boundary between the engine and a browser driver
//!
//! This crate defines what the engine consumes from the outside world:
//! - `Driver`: element lookup, input, script execution and page state
//! - `EvidenceHook`: best-effort checkpoint callback (screenshots, logs)
//! - Shared scripts used for script-driven fallbacks
//! - `fake`: an in-memory DOM for tests (feature `fake`)

pub mod driver;
pub mod hook;
pub mod scripts;

#[cfg(feature = "fake")]
pub mod fake;

pub use driver::*;
pub use hook::*;
