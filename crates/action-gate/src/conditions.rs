//! Condition types for readiness checks
//!
//! Every condition is a read-only probe of the current DOM and may be
//! evaluated any number of times.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use sureclick_core_types::{DriverError, ElementRef, EngineError, Locator};
use sureclick_driver_port::Driver;

/// Caller-supplied predicate over DOM state.
///
/// Implementations must not mutate the page.
#[async_trait]
pub trait DomPredicate: Send + Sync {
    async fn evaluate(&self, driver: &dyn Driver) -> Result<bool, DriverError>;
}

/// Built-in condition kinds
#[derive(Clone)]
pub enum ConditionKind {
    /// At least one element matches
    Present(Locator),

    /// At least one matching element is displayed
    Visible(Locator),

    /// Nothing matches
    Absent(Locator),

    /// Nothing matching is displayed (absent, hidden or detached)
    Hidden(Locator),

    /// First match is enabled
    Enabled(Locator),

    UrlContains(String),

    UrlMatches(Regex),

    /// First match carries `name="value"`
    AttributeEquals {
        locator: Locator,
        name: String,
        value: String,
    },

    CountAtLeast { locator: Locator, count: usize },

    /// First match's text contains the needle
    TextContains { locator: Locator, text: String },

    /// Script returns a truthy value
    Script(String),

    Custom(Arc<dyn DomPredicate>),
}

/// Named boolean predicate over the current DOM
#[derive(Clone)]
pub struct Condition {
    name: String,
    kind: ConditionKind,
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition").field("name", &self.name).finish()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Condition {
    fn new(name: String, kind: ConditionKind) -> Self {
        Self { name, kind }
    }

    pub fn present(locator: Locator) -> Self {
        Self::new(format!("present({})", locator), ConditionKind::Present(locator))
    }

    pub fn visible(locator: Locator) -> Self {
        Self::new(format!("visible({})", locator), ConditionKind::Visible(locator))
    }

    pub fn absent(locator: Locator) -> Self {
        Self::new(format!("absent({})", locator), ConditionKind::Absent(locator))
    }

    pub fn hidden(locator: Locator) -> Self {
        Self::new(format!("hidden({})", locator), ConditionKind::Hidden(locator))
    }

    pub fn enabled(locator: Locator) -> Self {
        Self::new(format!("enabled({})", locator), ConditionKind::Enabled(locator))
    }

    pub fn url_contains(fragment: impl Into<String>) -> Self {
        let fragment = fragment.into();
        Self::new(
            format!("url_contains({})", fragment),
            ConditionKind::UrlContains(fragment),
        )
    }

    pub fn url_matches(pattern: &str) -> Result<Self, EngineError> {
        let regex = Regex::new(pattern)
            .map_err(|err| EngineError::InvalidSpec(format!("url pattern '{}': {}", pattern, err)))?;
        Ok(Self::new(
            format!("url_matches({})", pattern),
            ConditionKind::UrlMatches(regex),
        ))
    }

    pub fn attribute_equals(
        locator: Locator,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let value = value.into();
        Self::new(
            format!("attribute_equals({}, {}={})", locator, name, value),
            ConditionKind::AttributeEquals {
                locator,
                name,
                value,
            },
        )
    }

    pub fn count_at_least(locator: Locator, count: usize) -> Self {
        Self::new(
            format!("count_at_least({}, {})", locator, count),
            ConditionKind::CountAtLeast { locator, count },
        )
    }

    pub fn text_contains(locator: Locator, text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(
            format!("text_contains({}, {})", locator, text),
            ConditionKind::TextContains { locator, text },
        )
    }

    pub fn script(code: impl Into<String>) -> Self {
        let code = code.into();
        Self::new(format!("script({})", code), ConditionKind::Script(code))
    }

    pub fn custom(name: impl Into<String>, predicate: impl DomPredicate + 'static) -> Self {
        Self::new(name.into(), ConditionKind::Custom(Arc::new(predicate)))
    }

    /// Replace the generated name, e.g. to label a business signal.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ConditionKind {
        &self.kind
    }

    /// Evaluate once against the current DOM.
    pub async fn evaluate(&self, driver: &dyn Driver) -> Result<bool, DriverError> {
        match &self.kind {
            ConditionKind::Present(locator) => Ok(!find(driver, locator).await?.is_empty()),
            ConditionKind::Absent(locator) => Ok(find(driver, locator).await?.is_empty()),
            ConditionKind::Visible(locator) => {
                for element in find(driver, locator).await? {
                    match driver.is_displayed(&element).await {
                        Ok(true) => return Ok(true),
                        Ok(false) => {}
                        Err(err) if err.is_stale() => {}
                        Err(err) => return Err(err),
                    }
                }
                Ok(false)
            }
            ConditionKind::Hidden(locator) => {
                for element in find(driver, locator).await? {
                    match driver.is_displayed(&element).await {
                        Ok(true) => return Ok(false),
                        Ok(false) => {}
                        Err(err) if err.is_stale() => {}
                        Err(err) => return Err(err),
                    }
                }
                Ok(true)
            }
            ConditionKind::Enabled(locator) => match first(driver, locator).await? {
                Some(element) => driver.is_enabled(&element).await,
                None => Ok(false),
            },
            ConditionKind::UrlContains(fragment) => {
                Ok(driver.current_url().await?.contains(fragment.as_str()))
            }
            ConditionKind::UrlMatches(regex) => Ok(regex.is_match(&driver.current_url().await?)),
            ConditionKind::AttributeEquals {
                locator,
                name,
                value,
            } => match first(driver, locator).await? {
                Some(element) => Ok(driver
                    .get_attribute(&element, name)
                    .await?
                    .map(|actual| actual == *value)
                    .unwrap_or(false)),
                None => Ok(false),
            },
            ConditionKind::CountAtLeast { locator, count } => {
                Ok(find(driver, locator).await?.len() >= *count)
            }
            ConditionKind::TextContains { locator, text } => match first(driver, locator).await? {
                Some(element) => Ok(driver.text(&element).await?.contains(text.as_str())),
                None => Ok(false),
            },
            ConditionKind::Script(code) => {
                Ok(is_truthy(&driver.execute_script(code, Vec::new()).await?))
            }
            ConditionKind::Custom(predicate) => predicate.evaluate(driver).await,
        }
    }
}

async fn find(
    driver: &dyn Driver,
    locator: &Locator,
) -> Result<Vec<ElementRef>, DriverError> {
    driver.find_elements(locator.strategy, &locator.selector).await
}

async fn first(
    driver: &dyn Driver,
    locator: &Locator,
) -> Result<Option<ElementRef>, DriverError> {
    Ok(find(driver, locator).await?.into_iter().next())
}

/// JavaScript truthiness of a script result
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sureclick_driver_port::fake::{FakeDom, FakeElement};

    #[tokio::test]
    async fn hidden_covers_absent_and_undisplayed() {
        let dom = FakeDom::new();
        let spinner = Locator::css(".ant-spin-spinning");
        assert!(Condition::hidden(spinner.clone()).evaluate(&dom).await.unwrap());

        let el = dom.insert_css(".ant-spin-spinning", FakeElement::new().hidden());
        assert!(Condition::hidden(spinner.clone()).evaluate(&dom).await.unwrap());

        dom.detach(&el);
        dom.insert_css(".ant-spin-spinning", FakeElement::new());
        assert!(!Condition::hidden(spinner).evaluate(&dom).await.unwrap());
    }

    #[tokio::test]
    async fn attribute_and_text_read_first_match() {
        let dom = FakeDom::new();
        dom.insert_css(
            ".ant-message",
            FakeElement::new().text("Saved successfully").attr("role", "alert"),
        );
        let toast = Locator::css(".ant-message");
        assert!(Condition::text_contains(toast.clone(), "Saved")
            .evaluate(&dom)
            .await
            .unwrap());
        assert!(Condition::attribute_equals(toast.clone(), "role", "alert")
            .evaluate(&dom)
            .await
            .unwrap());
        assert!(!Condition::attribute_equals(toast, "role", "status")
            .evaluate(&dom)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn url_conditions() {
        let dom = FakeDom::new();
        dom.set_url("https://app.local/#/dashboard?tab=1");
        assert!(Condition::url_contains("/dashboard")
            .evaluate(&dom)
            .await
            .unwrap());
        assert!(Condition::url_matches(r"#/dash\w+")
            .unwrap()
            .evaluate(&dom)
            .await
            .unwrap());
        assert!(matches!(
            Condition::url_matches("(unclosed"),
            Err(EngineError::InvalidSpec(_))
        ));
    }

    #[tokio::test]
    async fn script_result_truthiness() {
        let dom = FakeDom::new();
        dom.on_script("return document.readyState === 'complete';", json!(true));
        assert!(Condition::script("return document.readyState === 'complete';")
            .evaluate(&dom)
            .await
            .unwrap());
        assert!(!Condition::script("return window.pending;")
            .evaluate(&dom)
            .await
            .unwrap());
        assert!(!is_truthy(&json!(0)));
        assert!(is_truthy(&json!("x")));
    }

    #[test]
    fn names_describe_the_probe() {
        let condition = Condition::count_at_least(Locator::css("tr"), 3);
        assert_eq!(condition.name(), "count_at_least(css=tr, 3)");
        assert_eq!(condition.named("rows loaded").to_string(), "rows loaded");
    }
}
