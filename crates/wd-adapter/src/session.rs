//! `Driver` implementation over a fantoccini client

use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Map, Value};
use sureclick_core_types::{DriverError, DriverErrorKind, ElementRef, LocatorStrategy};
use sureclick_driver_port::{Driver, ScriptArg};
use tracing::{debug, info};

use crate::errors::{map_cmd_error, map_session_error, wd_locator, wd_selector};
use crate::registry::ElementRegistry;

/// One W3C WebDriver session.
///
/// Element handles handed to the engine are table ids local to this
/// session; they are never shared across sessions.
pub struct WebDriverSession {
    client: Client,
    elements: ElementRegistry,
}

impl WebDriverSession {
    /// Open a session against a running driver (e.g. `http://localhost:4444`).
    pub async fn connect(webdriver_url: &str, headless: bool) -> Result<Self, DriverError> {
        info!(webdriver = %webdriver_url, headless, "opening webdriver session");
        let client = ClientBuilder::rustls()
            .capabilities(capabilities(headless))
            .connect(webdriver_url)
            .await
            .map_err(map_session_error)?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            elements: ElementRegistry::new(),
        }
    }

    pub async fn goto(&self, url: &str) -> Result<(), DriverError> {
        debug!(url, "navigating");
        self.client.goto(url).await.map_err(map_cmd_error)?;
        // old page's nodes are gone
        self.elements.clear();
        Ok(())
    }

    /// End the browser session; handles from it become unusable.
    pub async fn close(&self) -> Result<(), DriverError> {
        self.elements.clear();
        self.client.clone().close().await.map_err(map_cmd_error)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn script_arg(&self, arg: ScriptArg) -> Result<Value, DriverError> {
        match arg {
            ScriptArg::Json(value) => Ok(value),
            ScriptArg::Element(handle) => {
                let element = self.elements.get(&handle)?;
                serde_json::to_value(&element).map_err(|err| {
                    DriverError::new(DriverErrorKind::Script, format!("{}: {}", handle, err))
                })
            }
        }
    }
}

fn capabilities(headless: bool) -> Map<String, Value> {
    let mut caps = Map::new();
    let mut chrome_args = vec!["--no-sandbox", "--disable-dev-shm-usage"];
    let mut firefox_args = Vec::new();
    if headless {
        chrome_args.push("--headless=new");
        chrome_args.push("--disable-gpu");
        firefox_args.push("--headless");
    }
    caps.insert("goog:chromeOptions".into(), json!({ "args": chrome_args }));
    caps.insert("moz:firefoxOptions".into(), json!({ "args": firefox_args }));
    caps
}

#[async_trait]
impl Driver for WebDriverSession {
    async fn find_elements(
        &self,
        strategy: LocatorStrategy,
        selector: &str,
    ) -> Result<Vec<ElementRef>, DriverError> {
        let (strategy, selector) = wd_selector(strategy, selector);
        let found = self
            .client
            .find_all(wd_locator(strategy, &selector))
            .await
            .map_err(map_cmd_error)?;
        Ok(found.into_iter().map(|el| self.elements.register(el)).collect())
    }

    async fn find_within(
        &self,
        parent: &ElementRef,
        strategy: LocatorStrategy,
        selector: &str,
    ) -> Result<Vec<ElementRef>, DriverError> {
        let parent = self.elements.get(parent)?;
        let (strategy, selector) = wd_selector(strategy, selector);
        let found = parent
            .find_all(wd_locator(strategy, &selector))
            .await
            .map_err(map_cmd_error)?;
        Ok(found.into_iter().map(|el| self.elements.register(el)).collect())
    }

    async fn click(&self, element: &ElementRef) -> Result<(), DriverError> {
        self.elements.get(element)?.click().await.map_err(map_cmd_error)
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<(), DriverError> {
        self.elements
            .get(element)?
            .send_keys(text)
            .await
            .map_err(map_cmd_error)
    }

    async fn clear(&self, element: &ElementRef) -> Result<(), DriverError> {
        self.elements.get(element)?.clear().await.map_err(map_cmd_error)
    }

    async fn execute_script(
        &self,
        code: &str,
        args: Vec<ScriptArg>,
    ) -> Result<Value, DriverError> {
        let args = args
            .into_iter()
            .map(|arg| self.script_arg(arg))
            .collect::<Result<Vec<_>, _>>()?;
        self.client.execute(code, args).await.map_err(map_cmd_error)
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self
            .client
            .current_url()
            .await
            .map_err(map_cmd_error)?
            .to_string())
    }

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool, DriverError> {
        self.elements
            .get(element)?
            .is_displayed()
            .await
            .map_err(map_cmd_error)
    }

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool, DriverError> {
        self.elements
            .get(element)?
            .is_enabled()
            .await
            .map_err(map_cmd_error)
    }

    async fn get_attribute(
        &self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let element = self.elements.get(element)?;
        // live form state is a property, not the markup attribute
        let result = match name {
            "value" | "checked" => element.prop(name).await,
            _ => element.attr(name).await,
        };
        result.map_err(map_cmd_error)
    }

    async fn text(&self, element: &ElementRef) -> Result<String, DriverError> {
        self.elements.get(element)?.text().await.map_err(map_cmd_error)
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        self.client.screenshot().await.map_err(map_cmd_error)
    }
}
