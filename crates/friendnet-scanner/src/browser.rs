use async_trait::async_trait;
use friendnet_core::{FriendNetError, Result};
use std::time::Duration;

/// Cookie copied out of the automated browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserCookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
}

impl BrowserCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
        }
    }
}

/// Visible text and target of one rendered connection card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCard {
    pub text: String,
    pub href: Option<String>,
}

/// The subset of browser automation the scanner relies on.
///
/// Every call blocks the scan until the browser answers; implementations are
/// driven from a single task and never shared.
#[async_trait]
pub trait Browser: Send {
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Waits up to `timeout` for an element matching `selector`.
    /// Returns `Ok(false)` when the wait runs out.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool>;

    async fn click(&mut self, selector: &str) -> Result<()>;

    /// Clears the matching input and types `value` into it.
    async fn fill(&mut self, selector: &str, value: &str) -> Result<()>;

    async fn count(&mut self, selector: &str) -> Result<usize>;

    /// Asks the page to scroll to its end so lazy content gets requested.
    async fn scroll_to_end(&mut self) -> Result<()>;

    /// All `card` elements below the first `panel` element.
    async fn cards(&mut self, panel: &str, card: &str) -> Result<Vec<RawCard>>;

    async fn page_source(&mut self) -> Result<String>;

    async fn cookies(&mut self) -> Result<Vec<BrowserCookie>>;

    /// Ends the automated session. Safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn Browser>>;
}

pub(crate) fn browser_error(err: impl std::fmt::Display) -> FriendNetError {
    FriendNetError::Browser(err.to_string())
}
