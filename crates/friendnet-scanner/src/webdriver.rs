use crate::browser::{browser_error, Browser, BrowserCookie, BrowserLauncher, RawCard};
use async_trait::async_trait;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use friendnet_core::{BrowserConfig, Result};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

/// [`Browser`] backed by a WebDriver server (chromedriver, geckodriver, ...).
pub struct WebDriverBrowser {
    client: Client,
    closed: bool,
}

impl WebDriverBrowser {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            closed: false,
        }
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn goto(&mut self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.client.goto(url).await.map_err(browser_error)
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool> {
        match self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
        {
            Ok(_) => Ok(true),
            Err(CmdError::WaitTimeout) => Ok(false),
            Err(e) => Err(browser_error(e)),
        }
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        let element = self
            .client
            .find(Locator::Css(selector))
            .await
            .map_err(browser_error)?;
        element.click().await.map_err(browser_error)
    }

    async fn fill(&mut self, selector: &str, value: &str) -> Result<()> {
        let element = self
            .client
            .find(Locator::Css(selector))
            .await
            .map_err(browser_error)?;
        element.clear().await.map_err(browser_error)?;
        element.send_keys(value).await.map_err(browser_error)
    }

    async fn count(&mut self, selector: &str) -> Result<usize> {
        let elements = self
            .client
            .find_all(Locator::Css(selector))
            .await
            .map_err(browser_error)?;
        Ok(elements.len())
    }

    async fn scroll_to_end(&mut self) -> Result<()> {
        self.client
            .execute("window.scrollTo(0, document.body.scrollHeight);", vec![])
            .await
            .map_err(browser_error)?;
        Ok(())
    }

    async fn cards(&mut self, panel: &str, card: &str) -> Result<Vec<RawCard>> {
        let panel = self
            .client
            .find(Locator::Css(panel))
            .await
            .map_err(browser_error)?;
        let elements = panel
            .find_all(Locator::Css(card))
            .await
            .map_err(browser_error)?;

        let mut cards = Vec::with_capacity(elements.len());
        for element in elements {
            let text = element.text().await.map_err(browser_error)?;
            let href = element.attr("href").await.map_err(browser_error)?;
            cards.push(RawCard { text, href });
        }
        Ok(cards)
    }

    async fn page_source(&mut self) -> Result<String> {
        self.client.source().await.map_err(browser_error)
    }

    async fn cookies(&mut self) -> Result<Vec<BrowserCookie>> {
        let cookies = self
            .client
            .get_all_cookies()
            .await
            .map_err(browser_error)?;
        Ok(cookies
            .iter()
            .map(|cookie| BrowserCookie {
                name: cookie.name().to_string(),
                value: cookie.value().to_string(),
                domain: cookie.domain().map(str::to_string),
            })
            .collect())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.client.clone().close().await.map_err(browser_error)
    }
}

/// Opens a fresh WebDriver session per scan.
pub struct WebDriverLauncher {
    webdriver_url: String,
    headless: bool,
}

impl WebDriverLauncher {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            webdriver_url: config.webdriver_url.clone(),
            headless: config.headless,
        }
    }
}

#[async_trait]
impl BrowserLauncher for WebDriverLauncher {
    async fn launch(&self) -> Result<Box<dyn Browser>> {
        let mut args = vec!["--window-size=1280,1024"];
        if self.headless {
            args.extend(["--headless", "--no-sandbox"]);
        }

        let mut capabilities = serde_json::Map::new();
        capabilities.insert("goog:chromeOptions".to_string(), json!({ "args": args }));

        let client = ClientBuilder::native()
            .capabilities(capabilities)
            .connect(&self.webdriver_url)
            .await
            .map_err(browser_error)?;

        info!(
            "Browser session opened on {} (headless: {})",
            self.webdriver_url, self.headless
        );
        Ok(Box::new(WebDriverBrowser::new(client)))
    }
}
