//! Locator resolution - first live match across alternative locators
//!
//! A `LocatorSet` lists several ways of finding one logical element. The
//! resolver polls each candidate in priority order for an even share of the
//! overall timeout and returns the first element found:
//! - priority order is the tie-break when several candidates would match
//! - every candidate gets at least one lookup
//! - exhausting all candidates yields `EngineError::NotFound`

pub mod resolver;
pub mod types;

pub use resolver::*;
pub use types::*;
