//! Error taxonomy shared by every engine component

use std::fmt;

use thiserror::Error;

/// Classification of a failure reported by the automation driver.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// Handle refers to a node that left the DOM
    StaleReference,
    /// Node exists but cannot receive input
    NotInteractable,
    /// Another element (overlay, spinner, modal) would receive the click
    Intercepted,
    NoSuchElement,
    InvalidSelector,
    Script,
    Io,
    Unsupported,
    Internal,
}

impl DriverErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            DriverErrorKind::StaleReference => "stale element reference",
            DriverErrorKind::NotInteractable => "element not interactable",
            DriverErrorKind::Intercepted => "element click intercepted",
            DriverErrorKind::NoSuchElement => "no such element",
            DriverErrorKind::InvalidSelector => "invalid selector",
            DriverErrorKind::Script => "javascript error",
            DriverErrorKind::Io => "driver i/o failure",
            DriverErrorKind::Unsupported => "unsupported operation",
            DriverErrorKind::Internal => "internal error",
        }
    }
}

impl fmt::Display for DriverErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct DriverError {
    pub kind: DriverErrorKind,
    pub message: String,
}

impl DriverError {
    pub fn new(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn stale(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::StaleReference, message)
    }

    pub fn intercepted(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Intercepted, message)
    }

    pub fn not_interactable(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::NotInteractable, message)
    }

    pub fn is_stale(&self) -> bool {
        self.kind == DriverErrorKind::StaleReference
    }

    /// Element exists but is covered or not ready for input.
    pub fn is_obscured(&self) -> bool {
        matches!(
            self.kind,
            DriverErrorKind::NotInteractable | DriverErrorKind::Intercepted
        )
    }
}

/// Engine failure surfaced to callers.
///
/// Every variant carries enough context for a test report to say what was
/// looked for, for how long, and how far the engine got.
#[derive(Debug, Error, Clone)]
pub enum EngineError {
    /// No locator candidate resolved, or pagination ended without a match
    #[error("not found: {target} after {waited_ms}ms{}: {reason}", pages_suffix(.pages_visited))]
    NotFound {
        target: String,
        waited_ms: u64,
        pages_visited: Option<u32>,
        reason: String,
    },

    /// A readiness gate never became true in time
    #[error("timeout after {waited_ms}ms waiting for {spec} (pending: {})", .pending.join(", "))]
    Timeout {
        spec: String,
        waited_ms: u64,
        pending: Vec<String>,
    },

    /// The element kept detaching after every allowed re-resolution
    #[error("stale reference for {target} after {attempts} re-resolution(s)")]
    StaleReference { target: String, attempts: u32 },

    /// Paging produced identical content on consecutive advances
    #[error("no progress paging for {target}: {attempts} advance(s) left rows unchanged after {pages_visited} page(s)")]
    NoProgress {
        target: String,
        pages_visited: u32,
        attempts: u32,
    },

    /// Both operations failed, or the post-condition never held
    #[error("action {op} on {target} failed: {reason}")]
    ActionFailed {
        target: String,
        op: String,
        reason: String,
    },

    /// A value object violated its construction invariant
    #[error("invalid spec: {0}")]
    InvalidSpec(String),

    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
}

fn pages_suffix(pages: &Option<u32>) -> String {
    match pages {
        Some(pages) => format!(" across {} page(s)", pages),
        None => String::new(),
    }
}

impl EngineError {
    /// Transient classes that the engine retries internally.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::StaleReference { .. } => true,
            EngineError::Driver(err) => err.is_stale() || err.is_obscured(),
            _ => false,
        }
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            EngineError::NoProgress { .. } | EngineError::InvalidSpec(_) => 3,
            EngineError::ActionFailed { .. } | EngineError::Driver(_) => 2,
            EngineError::NotFound { .. } | EngineError::Timeout { .. } => 1,
            EngineError::StaleReference { .. } => 0,
        }
    }

    /// Short stable name for logs and evidence labels.
    pub fn kind_name(&self) -> &'static str {
        match self {
            EngineError::NotFound { .. } => "not_found",
            EngineError::Timeout { .. } => "timeout",
            EngineError::StaleReference { .. } => "stale_reference",
            EngineError::NoProgress { .. } => "no_progress",
            EngineError::ActionFailed { .. } => "action_failed",
            EngineError::InvalidSpec(_) => "invalid_spec",
            EngineError::Driver(_) => "driver",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_error_classes() {
        assert!(DriverError::stale("gone").is_stale());
        assert!(DriverError::intercepted("overlay").is_obscured());
        assert!(DriverError::not_interactable("hidden").is_obscured());
        assert!(!DriverError::new(DriverErrorKind::Io, "eof").is_obscured());
    }

    #[test]
    fn not_found_message_includes_pages() {
        let err = EngineError::NotFound {
            target: "row 'Ana'".into(),
            waited_ms: 1200,
            pages_visited: Some(3),
            reason: "page limit reached".into(),
        };
        assert_eq!(
            err.to_string(),
            "not found: row 'Ana' after 1200ms across 3 page(s): page limit reached"
        );
    }

    #[test]
    fn timeout_lists_pending_conditions() {
        let err = EngineError::Timeout {
            spec: "all(a, b)".into(),
            waited_ms: 500,
            pending: vec!["a".into()],
        };
        assert!(err.to_string().contains("pending: a"));
        assert!(!err.is_retryable());
        assert_eq!(err.kind_name(), "timeout");
    }
}
