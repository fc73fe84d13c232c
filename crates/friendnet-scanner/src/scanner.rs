use crate::browser::{Browser, BrowserLauncher};
use crate::pagination::{PaginatedClient, ResourceKind};
use crate::reconcile::{reconcile, Reconciliation};
use crate::session::{Credentials, ScanSession, SessionCredentials, SessionEstablisher};
use crate::source::mutual_friend_source;
use crate::transport::{GraphQlTransport, HttpTransport};
use crate::webdriver::WebDriverLauncher;
use friendnet_core::{ApiConfig, FriendNetConfig, Result, ScanDataset, ScanEvent};
use std::sync::Arc;
use tracing::{info, warn};

/// Builds the HTTP side of a scan once the browser login has succeeded.
pub type TransportFactory =
    Box<dyn Fn(&ApiConfig, &SessionCredentials) -> Result<Arc<dyn GraphQlTransport>> + Send + Sync>;

/// Runs one scan end to end: login, friend list, mutual friends per friend,
/// reconciliation.
///
/// The scanner owns the browser for the duration of [`scan`](Self::scan) and
/// closes it on every exit path. There is no cancellation: aborting a scan
/// means dropping the future or killing the WebDriver session from outside.
pub struct FriendNetworkScanner {
    config: FriendNetConfig,
    launcher: Box<dyn BrowserLauncher>,
    transport_factory: TransportFactory,
}

impl FriendNetworkScanner {
    pub fn new(config: FriendNetConfig) -> Self {
        let launcher = Box::new(WebDriverLauncher::new(&config.browser));
        let referer = config.browser.friends_list_url.clone();
        let transport_factory: TransportFactory = Box::new(
            move |api: &ApiConfig, session: &SessionCredentials| -> Result<Arc<dyn GraphQlTransport>> {
                let transport = HttpTransport::new(api, &session.cookies, &referer)?;
                Ok(Arc::new(transport))
            },
        );

        Self {
            config,
            launcher,
            transport_factory,
        }
    }

    pub fn with_launcher(mut self, launcher: Box<dyn BrowserLauncher>) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn with_transport_factory(mut self, factory: TransportFactory) -> Self {
        self.transport_factory = factory;
        self
    }

    /// Scans the account behind `credentials`.
    ///
    /// `progress` is called synchronously at coarse milestones; it must return
    /// quickly because the scan waits for it.
    pub async fn scan(
        &self,
        credentials: &Credentials,
        progress: &mut (dyn FnMut(&ScanEvent) + Send),
    ) -> Result<ScanDataset> {
        progress(&ScanEvent::Configuring);
        let mut browser = self.launcher.launch().await?;

        let outcome = self
            .scan_with_browser(browser.as_mut(), credentials, progress)
            .await;

        if let Err(e) = browser.close().await {
            warn!("Failed to close browser session: {}", e);
        }
        outcome
    }

    async fn scan_with_browser(
        &self,
        browser: &mut dyn Browser,
        credentials: &Credentials,
        progress: &mut (dyn FnMut(&ScanEvent) + Send),
    ) -> Result<ScanDataset> {
        let session_credentials = SessionEstablisher::new(&self.config.browser)
            .establish(browser, credentials)
            .await?;

        let transport = (self.transport_factory)(&self.config.api, &session_credentials)?;
        let api = PaginatedClient::new(transport, session_credentials.token, self.config.api.clone());
        let mut session = ScanSession { browser, api };

        progress(&ScanEvent::ReadingFriendList);
        let friends = session.api.fetch_all(&ResourceKind::FriendList).await?;
        info!("Friend list has {} entries", friends.len());
        progress(&ScanEvent::FriendListRead {
            count: friends.len(),
        });

        let source = mutual_friend_source(&self.config);
        let mut dataset = ScanDataset::new(friends.clone());
        let total = friends.len();

        for (index, friend) in friends.iter().enumerate() {
            let Some(friend_id) = friend.id.clone() else {
                warn!("Friend {} has no id, skipping", friend);
                continue;
            };
            let name = friend.to_string();

            progress(&ScanEvent::ReadingMutualFriends {
                index: index + 1,
                total,
                name: name.clone(),
            });
            let mutual = source.mutual_friends(&mut session, friend).await?;
            progress(&ScanEvent::MutualFriendsRead {
                name,
                count: mutual.len(),
            });

            dataset.record_mutual_friends(friend_id, mutual);
        }

        let Reconciliation {
            dataset,
            unresolved,
        } = reconcile(&dataset);
        if !unresolved.is_empty() {
            warn!(
                "{} mutual friends could not be matched to the friend list and will have no edge",
                unresolved.len()
            );
        }
        progress(&ScanEvent::Reconciled {
            unresolved: unresolved.len(),
        });

        info!(
            "Scan finished: {} friends, {} mutual lists ({} source)",
            dataset.friends.len(),
            dataset.mutual_friends.len(),
            source.kind()
        );
        progress(&ScanEvent::Finished);
        Ok(dataset)
    }
}
