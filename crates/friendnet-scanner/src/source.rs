use crate::dom_scraper::DomScraper;
use crate::pagination::ResourceKind;
use crate::session::ScanSession;
use async_trait::async_trait;
use friendnet_core::{DomConfig, FriendNetConfig, Identity, IdentityCollection, MutualFriendSourceKind, Result};
use tracing::warn;

/// Capability of reading the connections a friend shares with the scanned
/// account.
#[async_trait]
pub trait MutualFriendSource: Send + Sync {
    fn kind(&self) -> MutualFriendSourceKind;

    async fn mutual_friends(&self, session: &mut ScanSession<'_>, friend: &Identity) -> Result<IdentityCollection>;
}

/// Reads mutual friends from the structured paginated endpoint. Records carry ids.
pub struct ApiMutualFriends;

#[async_trait]
impl MutualFriendSource for ApiMutualFriends {
    fn kind(&self) -> MutualFriendSourceKind {
        MutualFriendSourceKind::Api
    }

    async fn mutual_friends(&self, session: &mut ScanSession<'_>, friend: &Identity) -> Result<IdentityCollection> {
        let Some(id) = friend.id.as_deref() else {
            warn!("{} has no id, skipping structured lookup", friend);
            return Ok(IdentityCollection::default());
        };
        session.api.fetch_all(&ResourceKind::mutual_friends(id)).await
    }
}

/// Scrapes mutual friends from the profile page. Records carry no id until
/// reconciled.
pub struct DomMutualFriends {
    config: DomConfig,
}

impl DomMutualFriends {
    pub fn new(config: DomConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MutualFriendSource for DomMutualFriends {
    fn kind(&self) -> MutualFriendSourceKind {
        MutualFriendSourceKind::Dom
    }

    async fn mutual_friends(&self, session: &mut ScanSession<'_>, friend: &Identity) -> Result<IdentityCollection> {
        let Some(link) = friend.link.as_deref() else {
            warn!("{} has no profile link, skipping page scrape", friend);
            return Ok(IdentityCollection::default());
        };
        DomScraper::new(&self.config)
            .scrape(&mut *session.browser, link)
            .await
    }
}

pub fn mutual_friend_source(config: &FriendNetConfig) -> Box<dyn MutualFriendSource> {
    match config.scan.mutual_friend_source {
        MutualFriendSourceKind::Api => Box::new(ApiMutualFriends),
        MutualFriendSourceKind::Dom => Box::new(DomMutualFriends::new(config.dom.clone())),
    }
}
