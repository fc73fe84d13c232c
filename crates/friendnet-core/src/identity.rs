use crate::{FriendNetError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A person as seen by the scanner.
///
/// Records coming from the structured endpoint carry an `id`; records scraped
/// from a profile page only carry `name` and `link` until they are reconciled
/// against the friend list. The derived `PartialEq` compares records field by
/// field; use [`Identity::same_person`] to ask whether two records describe the
/// same person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "user_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub link: Option<String>,
    pub gender: Option<String>,
}

/// Attribute selector used by projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityField {
    Id,
    Name,
    Link,
    Gender,
}

impl Identity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            link: Some(link.into()),
            gender: None,
        }
    }

    /// A record scraped from a connection card: no id is known yet.
    pub fn scraped(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            link: Some(link.into()),
            gender: None,
        }
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    pub fn field(&self, field: IdentityField) -> Option<&str> {
        match field {
            IdentityField::Id => self.id.as_deref(),
            IdentityField::Name => self.name.as_deref(),
            IdentityField::Link => self.link.as_deref(),
            IdentityField::Gender => self.gender.as_deref(),
        }
    }

    /// Identity equality.
    ///
    /// Two records are the same person only when both carry the same id. Sharing
    /// an id while disagreeing on name or link is reported as
    /// [`FriendNetError::DataInconsistency`]. Records with differing or absent
    /// ids are never the same person.
    pub fn same_person(&self, other: &Identity) -> Result<bool> {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) if a == b => {
                if self.name == other.name && self.link == other.link {
                    Ok(true)
                } else {
                    Err(FriendNetError::DataInconsistency(format!(
                        "two identities share id {a} but differ in name or link"
                    )))
                }
            }
            _ => Ok(false),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.id) {
            (Some(name), _) => write!(f, "{name}"),
            (None, Some(id)) => write!(f, "#{id}"),
            (None, None) => write!(f, "<unknown>"),
        }
    }
}

/// Exact-match filter over a subset of identity attributes.
///
/// Unset attributes are ignored; every set attribute must equal the
/// corresponding field of the candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityFilter {
    pub id: Option<String>,
    pub name: Option<String>,
    pub link: Option<String>,
    pub gender: Option<String>,
}

impl IdentityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    pub fn matches(&self, identity: &Identity) -> bool {
        fn check(wanted: &Option<String>, actual: &Option<String>) -> bool {
            match wanted {
                Some(value) => actual.as_deref() == Some(value.as_str()),
                None => true,
            }
        }

        check(&self.id, &identity.id)
            && check(&self.name, &identity.name)
            && check(&self.link, &identity.link)
            && check(&self.gender, &identity.gender)
    }
}

impl fmt::Display for IdentityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            ("id", &self.id),
            ("name", &self.name),
            ("link", &self.link),
            ("gender", &self.gender),
        ]
        .iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| format!("{key}={v}")))
        .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_id_same_attributes_is_same_person() {
        let a = Identity::new("1", "A", "a");
        let b = Identity::new("1", "A", "a");
        assert!(a.same_person(&b).unwrap());
    }

    #[test]
    fn test_same_id_different_name_is_inconsistent() {
        let a = Identity::new("1", "A", "a");
        let b = Identity::new("1", "B", "a");
        assert!(matches!(
            a.same_person(&b),
            Err(FriendNetError::DataInconsistency(_))
        ));

        let c = Identity::new("1", "A", "other");
        assert!(a.same_person(&c).is_err());
    }

    #[test]
    fn test_different_or_missing_ids_never_match() {
        let a = Identity::new("1", "A", "a");
        let b = Identity::new("2", "A", "a");
        assert!(!a.same_person(&b).unwrap());

        let scraped = Identity::scraped("A", "a");
        assert!(!scraped.same_person(&scraped.clone()).unwrap());
        assert!(!a.same_person(&scraped).unwrap());
    }

    #[test]
    fn test_filter_matches_subset_of_attributes() {
        let person = Identity::new("7", "Ada", "x.com").with_gender("FEMALE");
        assert!(IdentityFilter::new().link("x.com").matches(&person));
        assert!(IdentityFilter::new().id("7").name("Ada").matches(&person));
        assert!(!IdentityFilter::new().id("7").name("Bob").matches(&person));
        assert!(IdentityFilter::new().matches(&person));
    }

    #[test]
    fn test_serializes_all_fields_with_nulls() {
        let json = serde_json::to_value(Identity::scraped("A", "a")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"user_id": null, "name": "A", "link": "a", "gender": null})
        );
    }
}
