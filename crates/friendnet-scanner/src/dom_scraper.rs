use crate::browser::{Browser, RawCard};
use friendnet_core::{DomConfig, FriendNetError, Identity, IdentityCollection, Result};
use tokio::time::Instant;
use tracing::debug;
use url::Url;

const GENERIC_PROFILE_PATH: &str = "/profile.php";
const MUTUAL_FRIENDS_SECTION: &str = "friends_mutual";

/// Mutual-connections page for a profile link.
///
/// Generic `profile.php?id=...` links take a query parameter, vanity links a
/// path segment.
pub fn mutual_friends_url(profile_link: &str) -> Result<String> {
    let invalid = |reason: String| {
        FriendNetError::MalformedResponse(format!("invalid profile link {profile_link}: {reason}"))
    };
    let mut url = Url::parse(profile_link).map_err(|e| invalid(e.to_string()))?;

    if url.path() == GENERIC_PROFILE_PATH {
        url.query_pairs_mut().append_pair("sk", MUTUAL_FRIENDS_SECTION);
    } else {
        url.path_segments_mut()
            .map_err(|_| invalid("link has no path".to_string()))?
            .pop_if_empty()
            .push(MUTUAL_FRIENDS_SECTION);
    }
    Ok(url.into())
}

/// Scrapes the connection cards rendered on a friend's profile.
pub struct DomScraper<'a> {
    config: &'a DomConfig,
}

impl<'a> DomScraper<'a> {
    pub fn new(config: &'a DomConfig) -> Self {
        Self { config }
    }

    /// Loads the mutual-connections page of `profile_link` and returns one
    /// id-less record per card.
    pub async fn scrape(&self, browser: &mut dyn Browser, profile_link: &str) -> Result<IdentityCollection> {
        let url = mutual_friends_url(profile_link)?;
        browser.goto(&url).await?;
        self.wait_until_loaded(browser, &url).await?;

        let selectors = &self.config.selectors;
        let cards = browser
            .cards(&selectors.connections_panel, &selectors.connection_card)
            .await?;
        debug!("{} connection cards on {}", cards.len(), url);

        Ok(cards.into_iter().map(card_to_identity).collect())
    }

    /// Scrolls until the loading indicator disappears, within the attempt and
    /// wall-clock budget.
    async fn wait_until_loaded(&self, browser: &mut dyn Browser, url: &str) -> Result<()> {
        let started = Instant::now();
        let indicator = &self.config.selectors.loading_indicator;
        let mut attempts = 0u32;

        tokio::time::sleep(self.config.initial_wait()).await;
        while browser.count(indicator).await? > 0 {
            if attempts >= self.config.max_scroll_attempts || started.elapsed() >= self.config.load_timeout() {
                return Err(FriendNetError::LoadingTimeout(format!(
                    "{url} still loading after {attempts} scrolls in {:?}",
                    started.elapsed()
                )));
            }
            browser.scroll_to_end().await?;
            attempts += 1;
            tokio::time::sleep(self.config.poll_interval()).await;
        }

        debug!("{} loaded after {} scrolls", url, attempts);
        Ok(())
    }
}

fn card_to_identity(card: RawCard) -> Identity {
    let name = card
        .text
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string);

    Identity {
        id: None,
        name,
        link: card.href,
        gender: None,
    }
}
