use serde::{Deserialize, Serialize};

use super::{IdentityRecord, IdentityUrl};

/// Ordered set of identities signed in on one server-side session.
///
/// No two records share an `identity_url`. The first record is the primary
/// identity; re-verifying an identity moves it to the back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionIdentitySet(Vec<IdentityRecord>);

impl SessionIdentitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any record with the same identity URL and append `record`.
    pub fn insert(&mut self, record: IdentityRecord) {
        self.0.retain(|existing| existing.identity_url != record.identity_url);
        self.0.push(record);
    }

    /// Remove the record for `identity_url`. Returns whether one was removed.
    pub fn remove(&mut self, identity_url: &IdentityUrl) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| &existing.identity_url != identity_url);
        before != self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn primary(&self) -> Option<&IdentityRecord> {
        self.0.first()
    }

    pub fn get(&self, identity_url: &IdentityUrl) -> Option<&IdentityRecord> {
        self.0.iter().find(|r| &r.identity_url == identity_url)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IdentityRecord> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<IdentityRecord> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SregFields;
    use chrono::{Duration, Utc};

    fn record(url: &str, nickname: &str) -> IdentityRecord {
        let mut sreg = SregFields::new();
        sreg.insert("nickname".to_string(), nickname.to_string());
        IdentityRecord::new(url.into(), sreg, Utc::now())
    }

    #[test]
    fn insert_deduplicates_by_identity_url() {
        let mut set = SessionIdentitySet::new();
        set.insert(record("https://a.example/", "old"));
        set.insert(record("https://a.example/", "new"));

        assert_eq!(set.len(), 1);
        assert_eq!(set.primary().unwrap().sreg_field("nickname"), Some("new"));
    }

    #[test]
    fn insert_is_idempotent_for_identical_records() {
        let mut set = SessionIdentitySet::new();
        let r = record("https://a.example/", "alice");
        set.insert(r.clone());
        set.insert(r.clone());
        assert_eq!(set.to_vec(), vec![r]);
    }

    #[test]
    fn primary_is_first_surviving_record() {
        let mut set = SessionIdentitySet::new();
        set.insert(record("https://a.example/", "a"));
        set.insert(record("https://b.example/", "b"));
        assert_eq!(set.primary().unwrap().identity_url.as_str(), "https://a.example/");

        // Re-verifying A moves it behind B.
        set.insert(record("https://a.example/", "a2"));
        assert_eq!(set.primary().unwrap().identity_url.as_str(), "https://b.example/");

        set.remove(&"https://b.example/".into());
        assert_eq!(set.primary().unwrap().identity_url.as_str(), "https://a.example/");
    }

    #[test]
    fn remove_only_touches_matching_record() {
        let mut set = SessionIdentitySet::new();
        set.insert(record("https://a.example/", "a"));
        set.insert(record("https://b.example/", "b"));

        assert!(set.remove(&"https://a.example/".into()));
        assert!(!set.remove(&"https://missing.example/".into()));
        assert_eq!(set.len(), 1);
        assert!(set.get(&"https://b.example/".into()).is_some());
    }

    #[test]
    fn clear_empties_the_set() {
        let mut set = SessionIdentitySet::new();
        set.insert(record("https://a.example/", "a"));
        set.clear();
        assert!(set.is_empty());
        assert!(set.primary().is_none());
    }

    #[test]
    fn serializes_as_plain_list() {
        let mut set = SessionIdentitySet::new();
        let mut r = record("https://a.example/", "a");
        r.issued_at = Utc::now() - Duration::minutes(5);
        set.insert(r);

        let json = serde_json::to_value(&set).unwrap();
        assert!(json.is_array());
        let back: SessionIdentitySet = serde_json::from_value(json).unwrap();
        assert_eq!(back, set);
    }
}
