//! Driver trait consumed by every engine component

use async_trait::async_trait;
use serde_json::Value;
use sureclick_core_types::{DriverError, ElementRef, LocatorStrategy};

/// Argument passed to `Driver::execute_script`.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptArg {
    Element(ElementRef),
    Json(Value),
}

impl From<ElementRef> for ScriptArg {
    fn from(element: ElementRef) -> Self {
        ScriptArg::Element(element)
    }
}

impl From<&str> for ScriptArg {
    fn from(value: &str) -> Self {
        ScriptArg::Json(Value::String(value.to_string()))
    }
}

/// Browser-automation driver for one session.
///
/// Passed explicitly into each engine call; the engine never stores it.
/// Any method taking an `ElementRef` may fail with a
/// `DriverErrorKind::StaleReference` error.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Find all elements currently matching, in document order
    async fn find_elements(
        &self,
        strategy: LocatorStrategy,
        selector: &str,
    ) -> Result<Vec<ElementRef>, DriverError>;

    /// Find descendants of `parent`
    async fn find_within(
        &self,
        parent: &ElementRef,
        strategy: LocatorStrategy,
        selector: &str,
    ) -> Result<Vec<ElementRef>, DriverError>;

    async fn click(&self, element: &ElementRef) -> Result<(), DriverError>;

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), DriverError>;

    async fn clear(&self, element: &ElementRef) -> Result<(), DriverError>;

    /// Execute a script; element args are available as `arguments[i]`
    async fn execute_script(&self, code: &str, args: Vec<ScriptArg>)
        -> Result<Value, DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool, DriverError>;

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool, DriverError>;

    async fn get_attribute(
        &self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    /// Rendered text of the element
    async fn text(&self, element: &ElementRef) -> Result<String, DriverError>;

    /// PNG screenshot of the current viewport
    async fn screenshot(&self) -> Result<Vec<u8>, DriverError>;
}
