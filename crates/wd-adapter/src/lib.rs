//! WebDriver adapter for the sureclick engine
//!
//! `WebDriverSession` implements the engine's `Driver` port on top of a
//! W3C WebDriver session (geckodriver, chromedriver, Selenium grid).
//! `ScreenshotHook` turns engine checkpoints into PNG evidence files.

pub mod errors;
pub mod evidence;
pub mod registry;
pub mod session;

pub use evidence::ScreenshotHook;
pub use registry::ElementRegistry;
pub use session::WebDriverSession;
