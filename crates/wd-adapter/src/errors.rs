//! Mapping of WebDriver failures and locators onto the driver port

use fantoccini::error::{CmdError, NewSessionError};
use fantoccini::Locator as WdLocator;
use sureclick_core_types::{DriverError, DriverErrorKind, LocatorStrategy};

/// Map a W3C error code onto the port's error kinds.
pub fn kind_for_code(code: &str) -> DriverErrorKind {
    match code {
        "stale element reference" => DriverErrorKind::StaleReference,
        "element not interactable" | "element not visible" => DriverErrorKind::NotInteractable,
        "element click intercepted" => DriverErrorKind::Intercepted,
        "no such element" => DriverErrorKind::NoSuchElement,
        "invalid selector" => DriverErrorKind::InvalidSelector,
        "javascript error" | "script timeout" => DriverErrorKind::Script,
        "unsupported operation" | "unknown command" => DriverErrorKind::Unsupported,
        _ => DriverErrorKind::Internal,
    }
}

pub fn map_cmd_error(err: CmdError) -> DriverError {
    let kind = match &err {
        CmdError::Standard(wd) => kind_for_code(wd.error.description()),
        other if other.is_no_such_element() => DriverErrorKind::NoSuchElement,
        _ => DriverErrorKind::Io,
    };
    DriverError::new(kind, err.to_string())
}

pub fn map_session_error(err: NewSessionError) -> DriverError {
    DriverError::new(DriverErrorKind::Io, format!("cannot open webdriver session: {}", err))
}

/// Selector text in the form fantoccini accepts for `strategy`.
///
/// WebDriver has no native `name` or tag-name strategy; both become CSS.
pub fn wd_selector(strategy: LocatorStrategy, selector: &str) -> (LocatorStrategy, String) {
    match strategy {
        LocatorStrategy::Name => (
            LocatorStrategy::Css,
            format!("[name=\"{}\"]", selector.replace('"', "\\\"")),
        ),
        LocatorStrategy::TagName => (LocatorStrategy::Css, selector.to_string()),
        other => (other, selector.to_string()),
    }
}

/// Borrow a fantoccini locator from a normalised selector.
pub fn wd_locator(strategy: LocatorStrategy, selector: &str) -> WdLocator<'_> {
    match strategy {
        LocatorStrategy::XPath => WdLocator::XPath(selector),
        LocatorStrategy::Id => WdLocator::Id(selector),
        LocatorStrategy::LinkText => WdLocator::LinkText(selector),
        _ => WdLocator::Css(selector),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn w3c_codes_map_to_transient_kinds() {
        assert!(DriverError::new(kind_for_code("stale element reference"), "").is_stale());
        assert!(DriverError::new(kind_for_code("element click intercepted"), "").is_obscured());
        assert!(DriverError::new(kind_for_code("element not interactable"), "").is_obscured());
        assert_eq!(kind_for_code("no such element"), DriverErrorKind::NoSuchElement);
        assert_eq!(kind_for_code("session not created"), DriverErrorKind::Internal);
    }

    #[test]
    fn name_and_tag_strategies_become_css() {
        assert_eq!(
            wd_selector(LocatorStrategy::Name, "username"),
            (LocatorStrategy::Css, "[name=\"username\"]".to_string())
        );
        assert_eq!(
            wd_selector(LocatorStrategy::TagName, "table"),
            (LocatorStrategy::Css, "table".to_string())
        );
        assert_eq!(
            wd_selector(LocatorStrategy::XPath, "//tr[1]"),
            (LocatorStrategy::XPath, "//tr[1]".to_string())
        );
    }
}
