//! Locator value objects

use std::fmt;
use std::str::FromStr;

use crate::errors::EngineError;

/// Strategy used to find an element, mirroring the WebDriver `By` set.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocatorStrategy {
    /// CSS selector
    Css,

    /// XPath expression
    XPath,

    /// `id` attribute
    Id,

    /// `name` attribute
    Name,

    /// Exact anchor text
    LinkText,

    /// Tag name
    TagName,
}

impl LocatorStrategy {
    /// Get strategy name as string
    pub fn name(&self) -> &'static str {
        match self {
            LocatorStrategy::Css => "css",
            LocatorStrategy::XPath => "xpath",
            LocatorStrategy::Id => "id",
            LocatorStrategy::Name => "name",
            LocatorStrategy::LinkText => "link",
            LocatorStrategy::TagName => "tag",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "css" => Some(LocatorStrategy::Css),
            "xpath" => Some(LocatorStrategy::XPath),
            "id" => Some(LocatorStrategy::Id),
            "name" => Some(LocatorStrategy::Name),
            "link" | "link_text" | "linktext" => Some(LocatorStrategy::LinkText),
            "tag" | "tag_name" => Some(LocatorStrategy::TagName),
            _ => None,
        }
    }
}

/// One way of finding a logical element.
///
/// Lower `priority` values are tried first.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    pub strategy: LocatorStrategy,
    pub selector: String,
    pub priority: i32,
}

impl Locator {
    pub fn new(strategy: LocatorStrategy, selector: impl Into<String>) -> Self {
        Self {
            strategy,
            selector: selector.into(),
            priority: 0,
        }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::Css, selector)
    }

    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::XPath, selector)
    }

    pub fn id(selector: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::Id, selector)
    }

    pub fn link_text(selector: impl Into<String>) -> Self {
        Self::new(LocatorStrategy::LinkText, selector)
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy.name(), self.selector)
    }
}

/// Parses `"css=#login"`, `"xpath=//button"`, `"id=submit"`.
impl FromStr for Locator {
    type Err = EngineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (strategy, selector) = raw
            .split_once('=')
            .ok_or_else(|| EngineError::InvalidSpec(format!("locator '{}' lacks '='", raw)))?;
        let strategy = LocatorStrategy::from_name(strategy).ok_or_else(|| {
            EngineError::InvalidSpec(format!("unknown locator strategy '{}'", strategy))
        })?;
        if selector.trim().is_empty() {
            return Err(EngineError::InvalidSpec(format!(
                "locator '{}' has an empty selector",
                raw
            )));
        }
        Ok(Locator::new(strategy, selector))
    }
}

/// Ordered alternatives for one logical element. Never empty.
///
/// Candidates are kept sorted by ascending priority; equal priorities keep
/// insertion order.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorSet {
    candidates: Vec<Locator>,
}

impl LocatorSet {
    pub fn new(mut candidates: Vec<Locator>) -> Result<Self, EngineError> {
        if candidates.is_empty() {
            return Err(EngineError::InvalidSpec(
                "LocatorSet requires at least one locator".to_string(),
            ));
        }
        candidates.sort_by_key(|locator| locator.priority);
        Ok(Self { candidates })
    }

    pub fn single(locator: Locator) -> Self {
        Self {
            candidates: vec![locator],
        }
    }

    /// Append a fallback tried after every existing candidate.
    pub fn or(mut self, locator: Locator) -> Self {
        let next = self
            .candidates
            .last()
            .map(|last| last.priority.saturating_add(1))
            .unwrap_or(0);
        self.candidates.push(locator.with_priority(next));
        self
    }

    pub fn candidates(&self) -> &[Locator] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn primary(&self) -> &Locator {
        &self.candidates[0]
    }
}

impl From<Locator> for LocatorSet {
    fn from(locator: Locator) -> Self {
        LocatorSet::single(locator)
    }
}

impl fmt::Display for LocatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, locator) in self.candidates.iter().enumerate() {
            if idx > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{}", locator)?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_is_rejected() {
        assert!(matches!(
            LocatorSet::new(Vec::new()),
            Err(EngineError::InvalidSpec(_))
        ));
    }

    #[test]
    fn candidates_sorted_by_priority_stably() {
        let set = LocatorSet::new(vec![
            Locator::css("#b").with_priority(2),
            Locator::css("#a1").with_priority(1),
            Locator::css("#a2").with_priority(1),
        ])
        .unwrap();
        let selectors: Vec<_> = set.candidates().iter().map(|l| l.selector.as_str()).collect();
        assert_eq!(selectors, vec!["#a1", "#a2", "#b"]);
    }

    #[test]
    fn or_appends_after_existing() {
        let set = LocatorSet::single(Locator::css("#save").with_priority(5))
            .or(Locator::xpath("//button[.='Guardar']"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.candidates()[1].priority, 6);
        assert_eq!(set.to_string(), "[css=#save | xpath=//button[.='Guardar']]");
    }

    #[test]
    fn parse_locator() {
        let locator: Locator = "xpath=//a[@href='/x']".parse().unwrap();
        assert_eq!(locator.strategy, LocatorStrategy::XPath);
        assert_eq!(locator.selector, "//a[@href='/x']");

        assert!("bogus=#x".parse::<Locator>().is_err());
        assert!("css=".parse::<Locator>().is_err());
        assert!("#x".parse::<Locator>().is_err());
    }
}
