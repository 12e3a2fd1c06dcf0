//! Shared primitives for the sureclick engine crates.
//!
//! Everything here is a plain value object: locators, element handles and
//! the error taxonomy every engine component reports through.

mod errors;
mod locator;

pub use errors::{DriverError, DriverErrorKind, EngineError};
pub use locator::{Locator, LocatorSet, LocatorStrategy};

use std::fmt;

use uuid::Uuid;

/// Driver-native handle to a live DOM node.
///
/// The handle carries no lifetime guarantee across engine calls: any use may
/// fail with a staleness error once the node is detached.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ElementRef(pub String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ActionId(pub String);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
