//! Action executor - interactions that must actually take effect
//!
//! An `ActionSpec` names a target, a primary and a fallback operation and a
//! post-condition. The executor:
//! - resolves the target through the locator resolver
//! - falls back when the primary is obscured or not interactable
//! - re-resolves from the locators when the element goes stale
//! - fails unless the post-condition holds afterwards

pub mod executor;
pub mod types;

pub use executor::*;
pub use types::*;
