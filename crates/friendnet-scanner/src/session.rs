use crate::browser::{Browser, BrowserCookie};
use crate::pagination::PaginatedClient;
use friendnet_core::{BrowserConfig, FriendNetError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info};

const SECURITY_TOKEN_PATTERN: &str =
    r#"\["DTSGInitData",\[\],\{"token":"\S+?","async_get_token":"\S+?"\},\d+\]"#;

/// Login for the scanned account.
#[derive(Debug)]
pub struct Credentials {
    pub user: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// What a successful login yields for the HTTP side of the scan.
#[derive(Debug, Clone)]
pub struct SessionCredentials {
    pub token: String,
    pub cookies: Vec<BrowserCookie>,
}

/// Authenticated state shared by the scan components.
///
/// The browser is borrowed from the scan orchestrator, which alone opens and
/// closes it.
pub struct ScanSession<'a> {
    pub browser: &'a mut dyn Browser,
    pub api: PaginatedClient,
}

/// Drives the login form and harvests cookies and the security token.
pub struct SessionEstablisher<'a> {
    config: &'a BrowserConfig,
}

impl<'a> SessionEstablisher<'a> {
    pub fn new(config: &'a BrowserConfig) -> Self {
        Self { config }
    }

    pub async fn establish(
        &self,
        browser: &mut dyn Browser,
        credentials: &Credentials,
    ) -> Result<SessionCredentials> {
        browser.goto(&self.config.login_url).await?;
        self.dismiss_consent_dialog(browser).await?;
        self.submit_credentials(browser, credentials).await?;

        tokio::time::sleep(self.config.settle()).await;
        browser.goto(&self.config.friends_list_url).await?;

        let cookies = browser.cookies().await?;
        let source = browser.page_source().await?;
        let token = extract_security_token(&source)?;

        info!(
            "Authenticated as {} ({} cookies harvested)",
            credentials.user,
            cookies.len()
        );
        Ok(SessionCredentials { token, cookies })
    }

    async fn dismiss_consent_dialog(&self, browser: &mut dyn Browser) -> Result<()> {
        let selector = &self.config.consent_button_selector;
        if browser.wait_for(selector, self.config.consent_timeout()).await? {
            browser.click(selector).await?;
            debug!("Consent dialog dismissed");
        } else {
            debug!("No consent dialog shown");
        }
        Ok(())
    }

    async fn submit_credentials(&self, browser: &mut dyn Browser, credentials: &Credentials) -> Result<()> {
        let timeout = self.config.login_field_timeout();
        for selector in [&self.config.email_selector, &self.config.password_selector] {
            if !browser.wait_for(selector, timeout).await? {
                return Err(FriendNetError::AuthenticationFailure(format!(
                    "login field {selector} not interactable within {timeout:?}"
                )));
            }
        }

        browser
            .fill(&self.config.email_selector, &credentials.user)
            .await?;
        browser
            .fill(
                &self.config.password_selector,
                credentials.password.expose_secret(),
            )
            .await?;

        let submit = &self.config.submit_selector;
        if !browser.wait_for(submit, self.config.submit_timeout()).await? {
            return Err(FriendNetError::AuthenticationFailure(format!(
                "login button {submit} not interactable"
            )));
        }
        browser.click(submit).await
    }
}

/// Pulls the security token out of the `DTSGInitData` state blob embedded in
/// the page.
pub fn extract_security_token(page_source: &str) -> Result<String> {
    lazy_static! {
        static ref SECURITY_TOKEN_REGEX: Regex =
            Regex::new(SECURITY_TOKEN_PATTERN).expect("security token pattern compiles");
    }

    let blob = SECURITY_TOKEN_REGEX
        .find(page_source)
        .ok_or_else(|| FriendNetError::TokenExtractionFailure("DTSGInitData not found".to_string()))?;

    let parsed: Value = serde_json::from_str(blob.as_str())
        .map_err(|e| FriendNetError::TokenExtractionFailure(format!("unreadable state blob: {e}")))?;

    parsed
        .get(2)
        .and_then(|state| state.get("token"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| FriendNetError::TokenExtractionFailure("state blob carries no token".to_string()))
}
