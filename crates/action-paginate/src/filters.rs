//! Built-in row predicate and filter action

use async_trait::async_trait;
use sureclick_core_types::{DriverError, ElementRef, EngineError, Locator, LocatorSet};
use sureclick_driver_port::scripts::{KEY_ENTER, SCRIPT_DISPATCH_INPUT};
use sureclick_driver_port::{Driver, ScriptArg};
use tracing::debug;

use crate::types::{FilterAction, RowPredicate};

/// Trimmed, case-insensitive text match on a row or one of its cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowText {
    pub needle: String,
    /// Whole-text equality instead of substring
    pub exact: bool,
    /// Cell to read, looked up inside the row; the row's own text otherwise
    pub column: Option<Locator>,
}

impl RowText {
    pub fn contains(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
            exact: false,
            column: None,
        }
    }

    pub fn exact(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
            exact: true,
            column: None,
        }
    }

    pub fn in_column(mut self, column: Locator) -> Self {
        self.column = Some(column);
        self
    }

    fn accepts(&self, text: &str) -> bool {
        let text = text.trim().to_lowercase();
        let needle = self.needle.trim().to_lowercase();
        if self.exact {
            text == needle
        } else {
            text.contains(&needle)
        }
    }
}

#[async_trait]
impl RowPredicate for RowText {
    async fn matches(&self, driver: &dyn Driver, row: &ElementRef) -> Result<bool, DriverError> {
        let text = match &self.column {
            Some(column) => {
                let cells = driver
                    .find_within(row, column.strategy, &column.selector)
                    .await?;
                match cells.first() {
                    Some(cell) => driver.text(cell).await?,
                    None => return Ok(false),
                }
            }
            None => driver.text(row).await?,
        };
        Ok(self.accepts(&text))
    }

    fn describe(&self) -> String {
        let mode = if self.exact { "equals" } else { "contains" };
        match &self.column {
            Some(column) => format!("row[{}] {} '{}'", column, mode, self.needle),
            None => format!("row {} '{}'", mode, self.needle),
        }
    }
}

/// Type into a search box and submit it.
///
/// Submits by clicking `submit` when given and clickable, otherwise by
/// pressing Enter in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAndSubmit {
    pub input: LocatorSet,
    pub text: String,
    pub submit: Option<LocatorSet>,
}

impl TypeAndSubmit {
    pub fn new(input: LocatorSet, text: impl Into<String>) -> Self {
        Self {
            input,
            text: text.into(),
            submit: None,
        }
    }

    pub fn with_submit(mut self, submit: LocatorSet) -> Self {
        self.submit = Some(submit);
        self
    }

    /// Ant Design search box (`.ant-input-search`).
    pub fn ant_design(text: impl Into<String>) -> Self {
        Self::new(
            LocatorSet::single(Locator::css(".ant-input-search input.ant-input")),
            text,
        )
        .with_submit(LocatorSet::single(Locator::css(".ant-input-search-button")))
    }
}

/// First element of the first candidate that currently matches.
async fn find_now(driver: &dyn Driver, set: &LocatorSet) -> Result<Option<ElementRef>, DriverError> {
    for locator in set.candidates() {
        let found = driver
            .find_elements(locator.strategy, &locator.selector)
            .await?;
        if let Some(element) = found.into_iter().next() {
            return Ok(Some(element));
        }
    }
    Ok(None)
}

#[async_trait]
impl FilterAction for TypeAndSubmit {
    async fn apply(&self, driver: &dyn Driver) -> Result<(), EngineError> {
        let input = find_now(driver, &self.input)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                target: self.input.to_string(),
                waited_ms: 0,
                pages_visited: None,
                reason: "search input not present".into(),
            })?;

        driver.clear(&input).await?;
        driver.send_keys(&input, &self.text).await?;
        if let Err(err) = driver
            .execute_script(SCRIPT_DISPATCH_INPUT, vec![ScriptArg::Element(input.clone())])
            .await
        {
            debug!(error = %err, "input event dispatch failed");
        }

        if let Some(submit) = &self.submit {
            match find_now(driver, submit).await {
                Ok(Some(button)) => match driver.click(&button).await {
                    Ok(()) => return Ok(()),
                    Err(err) => debug!(error = %err, "submit click failed; pressing Enter"),
                },
                Ok(None) => debug!(submit = %submit, "submit control absent; pressing Enter"),
                Err(err) => debug!(error = %err, "submit lookup failed; pressing Enter"),
            }
        }
        driver.send_keys(&input, KEY_ENTER).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("type '{}' into {}", self.text, self.input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sureclick_core_types::LocatorStrategy;
    use sureclick_driver_port::fake::{FakeDom, FakeElement, FakePager, PAGER_CELL, PAGER_ROWS};

    #[test]
    fn text_matching_is_trimmed_and_case_insensitive() {
        assert!(RowText::contains("ana").accepts("  Ana María "));
        assert!(RowText::exact("ana maría").accepts("Ana María"));
        assert!(!RowText::exact("ana").accepts("Ana María"));
    }

    #[tokio::test]
    async fn column_predicate_reads_the_cell() {
        let dom = FakeDom::new();
        let row = dom.insert_css(PAGER_ROWS, FakeElement::new().text("Ana Pérez admin@x.io"));
        dom.insert_child(
            &row,
            LocatorStrategy::Css,
            PAGER_CELL,
            FakeElement::new().text("Ana Pérez"),
        );
        let by_name = RowText::exact("ana pérez").in_column(Locator::css(PAGER_CELL));
        assert!(by_name.matches(&dom, &row).await.unwrap());
        assert!(!RowText::exact("ana pérez").matches(&dom, &row).await.unwrap());
    }

    #[tokio::test]
    async fn type_and_submit_filters_through_the_button() {
        let dom = FakeDom::new();
        let handles = FakePager::new(["Ana", "Beto", "Carla"], 1)
            .with_search()
            .install(&dom);
        TypeAndSubmit::ant_design("beto").apply(&dom).await.unwrap();

        let search_button = handles.search_button.unwrap();
        assert_eq!(dom.click_count(&search_button), 1);
        let rows = dom
            .find_elements(LocatorStrategy::Css, PAGER_ROWS)
            .await
            .unwrap();
        assert_eq!(dom.text(&rows[0]).await.unwrap(), "Beto");
    }

    #[tokio::test]
    async fn missing_input_is_reported() {
        let dom = FakeDom::new();
        let result = TypeAndSubmit::ant_design("x").apply(&dom).await;
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }
}
