//! Scripts and key codes shared by script-driven fallbacks

/// Click through script, bypassing overlay hit-testing.
pub const SCRIPT_CLICK: &str = "arguments[0].click();";

pub const SCRIPT_SCROLL_INTO_VIEW: &str =
    "arguments[0].scrollIntoView({block:'center', inline:'nearest'});";

/// Assign `arguments[1]` as the value and fire `input`/`change`, which
/// component libraries listen to instead of raw keystrokes.
pub const SCRIPT_SET_VALUE: &str = "const el = arguments[0]; \
const setter = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(el), 'value'); \
if (setter && setter.set) { setter.set.call(el, arguments[1]); } else { el.value = arguments[1]; } \
el.dispatchEvent(new Event('input', {bubbles: true})); \
el.dispatchEvent(new Event('change', {bubbles: true}));";

/// Fire `input`/`change` without touching the value.
pub const SCRIPT_DISPATCH_INPUT: &str = "arguments[0].dispatchEvent(new Event('input', {bubbles: true})); \
arguments[0].dispatchEvent(new Event('change', {bubbles: true}));";

/// WebDriver key code for Enter.
pub const KEY_ENTER: &str = "\u{E007}";
