use friendnet_core::{IdentityCollection, ScanDataset};
use std::collections::HashMap;

/// A scraped record whose link matched no friend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedIdentity {
    pub owner_id: String,
    pub name: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub dataset: ScanDataset,
    pub unresolved: Vec<UnresolvedIdentity>,
}

/// Fills missing mutual-friend ids from the friend list by exact link match.
///
/// The input is left untouched. The first friend carrying a link wins. Records
/// that stay without an id are kept in the dataset and listed in
/// [`Reconciliation::unresolved`].
pub fn reconcile(dataset: &ScanDataset) -> Reconciliation {
    let mut ids_by_link: HashMap<&str, &str> = HashMap::new();
    for friend in dataset.friends.iter() {
        if let (Some(link), Some(id)) = (friend.link.as_deref(), friend.id.as_deref()) {
            ids_by_link.entry(link).or_insert(id);
        }
    }

    let mut unresolved = Vec::new();
    let mutual_friends = dataset
        .mutual_friends
        .iter()
        .map(|(owner_id, mutual)| {
            let reconciled: IdentityCollection = mutual
                .iter()
                .cloned()
                .map(|mut person| {
                    if person.id.is_none() {
                        person.id = person
                            .link
                            .as_deref()
                            .and_then(|link| ids_by_link.get(link))
                            .map(|id| id.to_string());
                        if person.id.is_none() {
                            unresolved.push(UnresolvedIdentity {
                                owner_id: owner_id.clone(),
                                name: person.name.clone(),
                                link: person.link.clone(),
                            });
                        }
                    }
                    person
                })
                .collect();
            (owner_id.clone(), reconciled)
        })
        .collect();

    Reconciliation {
        dataset: ScanDataset {
            friends: dataset.friends.clone(),
            mutual_friends,
        },
        unresolved,
    }
}
