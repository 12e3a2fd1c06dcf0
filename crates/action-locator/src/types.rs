//! Core types for locator resolution

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sureclick_core_types::{ElementRef, Locator};

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Live handle; valid only for the caller's current operation
    pub element: ElementRef,

    /// Candidate that produced the element
    pub locator: Locator,

    /// Position of that candidate in the set (0 = primary)
    pub candidate_index: usize,

    /// Time spent from the first lookup to the match
    pub elapsed: Duration,
}

impl Resolution {
    pub fn used_fallback(&self) -> bool {
        self.candidate_index > 0
    }
}
