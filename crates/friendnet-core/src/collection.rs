use crate::{FriendNetError, Identity, IdentityField, IdentityFilter, Result};
use serde::{Deserialize, Serialize};

/// Ordered list of identities. Insertion order is preserved through every
/// operation, including serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityCollection {
    members: Vec<Identity>,
}

impl IdentityCollection {
    pub fn new(members: Vec<Identity>) -> Self {
        Self { members }
    }

    pub fn push(&mut self, identity: Identity) {
        self.members.push(identity);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Identity> {
        self.members.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Identity> {
        self.members.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Identity> {
        self.members.iter_mut()
    }

    pub fn as_slice(&self) -> &[Identity] {
        &self.members
    }

    pub fn into_vec(self) -> Vec<Identity> {
        self.members
    }

    /// First member matching every attribute set on `filter`.
    pub fn filter(&self, filter: &IdentityFilter) -> Result<&Identity> {
        self.find(filter)
            .ok_or_else(|| FriendNetError::NotFound(format!("no identity matches {filter}")))
    }

    /// Like [`filter`](Self::filter) but without the error.
    pub fn find(&self, filter: &IdentityFilter) -> Option<&Identity> {
        self.members.iter().find(|member| filter.matches(member))
    }

    pub fn find_by_link(&self, link: &str) -> Option<&Identity> {
        self.members
            .iter()
            .find(|member| member.link.as_deref() == Some(link))
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Identity> {
        self.members
            .iter()
            .find(|member| member.id.as_deref() == Some(id))
    }

    /// Collects one attribute across all members, in order.
    pub fn project(&self, field: IdentityField) -> Vec<Option<&str>> {
        self.members.iter().map(|m| m.field(field)).collect()
    }

    pub fn names(&self) -> Vec<Option<&str>> {
        self.project(IdentityField::Name)
    }

    pub fn ids(&self) -> Vec<Option<&str>> {
        self.project(IdentityField::Id)
    }

    /// Position-wise identity equality. Collections of different length are
    /// never the same; an inconsistent pair aborts the comparison.
    pub fn same_people(&self, other: &IdentityCollection) -> Result<bool> {
        if self.len() != other.len() {
            return Ok(false);
        }
        for (mine, theirs) in self.members.iter().zip(other.members.iter()) {
            if !mine.same_person(theirs)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl From<Vec<Identity>> for IdentityCollection {
    fn from(members: Vec<Identity>) -> Self {
        Self::new(members)
    }
}

impl FromIterator<Identity> for IdentityCollection {
    fn from_iter<I: IntoIterator<Item = Identity>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Extend<Identity> for IdentityCollection {
    fn extend<I: IntoIterator<Item = Identity>>(&mut self, iter: I) {
        self.members.extend(iter);
    }
}

impl IntoIterator for IdentityCollection {
    type Item = Identity;
    type IntoIter = std::vec::IntoIter<Identity>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

impl<'a> IntoIterator for &'a IdentityCollection {
    type Item = &'a Identity;
    type IntoIter = std::slice::Iter<'a, Identity>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> IdentityCollection {
        IdentityCollection::new(vec![
            Identity::new("1", "Ada", "a.com").with_gender("FEMALE"),
            Identity::new("2", "Bob", "b.com").with_gender("MALE"),
            Identity::new("3", "Ada", "c.com").with_gender("FEMALE"),
        ])
    }

    #[test]
    fn test_filter_returns_first_match() {
        let people = sample();
        let found = people.filter(&IdentityFilter::new().name("Ada")).unwrap();
        assert_eq!(found.id.as_deref(), Some("1"));

        let found = people
            .filter(&IdentityFilter::new().name("Ada").link("c.com"))
            .unwrap();
        assert_eq!(found.id.as_deref(), Some("3"));
    }

    #[test]
    fn test_filter_signals_not_found() {
        let people = sample();
        let err = people
            .filter(&IdentityFilter::new().name("Eve"))
            .unwrap_err();
        assert!(matches!(err, FriendNetError::NotFound(_)));
    }

    #[test]
    fn test_projection_keeps_order() {
        let people = sample();
        assert_eq!(people.names(), vec![Some("Ada"), Some("Bob"), Some("Ada")]);
        assert_eq!(
            people.project(IdentityField::Gender),
            vec![Some("FEMALE"), Some("MALE"), Some("FEMALE")]
        );
    }

    #[test]
    fn test_same_people_compares_positionally() {
        let people = sample();
        assert!(people.same_people(&sample()).unwrap());

        let mut shorter = sample().into_vec();
        shorter.pop();
        assert!(!people.same_people(&shorter.into()).unwrap());

        let mut renamed = sample().into_vec();
        renamed[1].name = Some("Robert".to_string());
        assert!(people.same_people(&renamed.into()).is_err());
    }
}
