use crate::{Identity, IdentityCollection, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Raw result of one scan: the account's friends plus, for every friend, the
/// connections they share with the account.
///
/// Built friend by friend while scanning, written once, then treated as
/// read-only by the analysis side. [`anonymize`](Self::anonymize) is the only
/// in-place rewrite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanDataset {
    #[serde(rename = "friend_list")]
    pub friends: IdentityCollection,
    #[serde(default)]
    pub mutual_friends: BTreeMap<String, IdentityCollection>,
}

impl ScanDataset {
    pub fn new(friends: IdentityCollection) -> Self {
        Self {
            friends,
            mutual_friends: BTreeMap::new(),
        }
    }

    pub fn record_mutual_friends(&mut self, owner_id: impl Into<String>, mutual: IdentityCollection) {
        self.mutual_friends.insert(owner_id.into(), mutual);
    }

    pub fn mutual_friends_of(&self, owner_id: &str) -> Option<&IdentityCollection> {
        self.mutual_friends.get(owner_id)
    }

    /// Every `(owner_id, mutual_friend)` pair, owners in key order.
    pub fn mutual_pairs(&self) -> impl Iterator<Item = (&str, &Identity)> {
        self.mutual_friends
            .iter()
            .flat_map(|(owner, mutual)| mutual.iter().map(move |m| (owner.as_str(), m)))
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.to_writer(&mut writer)?;
        writer.flush()?;
        info!(
            "Saved dataset with {} friends to {}",
            self.friends.len(),
            path.display()
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let dataset = Self::from_reader(BufReader::new(File::open(path)?))?;
        debug!(
            "Loaded dataset with {} friends and {} mutual lists from {}",
            dataset.friends.len(),
            dataset.mutual_friends.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Replaces every identifier with its SHA-256 hex digest.
    ///
    /// Names and links become the digest as well, so links still resolve to
    /// the right friend afterwards. Mutual-friend lists are re-keyed with the
    /// hashed owner id. Records without an id lose their name and keep a hashed
    /// link.
    pub fn anonymize(&mut self) {
        for friend in self.friends.iter_mut() {
            anonymize_identity(friend);
        }

        let mutual = std::mem::take(&mut self.mutual_friends);
        self.mutual_friends = mutual
            .into_iter()
            .map(|(owner, mut list)| {
                for person in list.iter_mut() {
                    anonymize_identity(person);
                }
                (hash_value(&owner), list)
            })
            .collect();
    }
}

fn hash_value(value: &str) -> String {
    format!("{:x}", Sha256::digest(value.as_bytes()))
}

fn anonymize_identity(identity: &mut Identity) {
    match identity.id.as_deref().map(hash_value) {
        Some(anonymous) => {
            identity.name = Some(anonymous.clone());
            identity.link = Some(anonymous.clone());
            identity.id = Some(anonymous);
        }
        None => {
            identity.name = None;
            identity.link = identity.link.as_deref().map(hash_value);
        }
    }
}
