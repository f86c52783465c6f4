//! Card persistence.
//!
//! The service only talks to the [`CardStore`] trait. Keys are exact-match
//! opaque strings and `put` is an upsert, so the last committed write for a
//! key wins. Implementations must give a caller read-your-writes on the same
//! key; nothing stronger is promised across callers.

mod schema;
mod sqlite;

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::profile::Profile;

pub use sqlite::SqliteStore;

/// Opaque, stable identifier of a published card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    /// Allocate a fresh random identifier (UUID v4, hyphenated).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CardId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CardId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Key-value persistence for card profiles.
pub trait CardStore: Send + Sync {
    /// Insert or overwrite the profile stored under `id`.
    fn put(&self, id: &CardId, profile: &Profile) -> Result<(), StoreError>;

    /// Overwrite the profile of an existing card in a single write.
    ///
    /// Returns `false` and writes nothing when no card is stored under `id`.
    fn replace(&self, id: &CardId, profile: &Profile) -> Result<bool, StoreError>;

    /// Load the profile stored under `id`. `None` means no such card.
    fn get(&self, id: &CardId) -> Result<Option<Profile>, StoreError>;

    /// Whether a card is stored under `id`.
    fn exists(&self, id: &CardId) -> Result<bool, StoreError> {
        Ok(self.get(id)?.is_some())
    }

    /// Remove the card stored under `id`. Removing a missing card is a no-op.
    fn delete(&self, id: &CardId) -> Result<(), StoreError>;
}

/// In-process store backed by a `HashMap`.
///
/// Used for tests and for ephemeral deployments (`TAPCARD_DB_PATH=:memory:`).
#[derive(Debug, Default)]
pub struct MemoryStore {
    cards: RwLock<HashMap<CardId, Profile>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored cards.
    pub fn len(&self) -> usize {
        self.cards.read().len()
    }

    /// Whether the store holds no cards.
    pub fn is_empty(&self) -> bool {
        self.cards.read().is_empty()
    }
}

impl CardStore for MemoryStore {
    fn put(&self, id: &CardId, profile: &Profile) -> Result<(), StoreError> {
        self.cards.write().insert(id.clone(), profile.clone());
        Ok(())
    }

    fn replace(&self, id: &CardId, profile: &Profile) -> Result<bool, StoreError> {
        match self.cards.write().get_mut(id) {
            Some(stored) => {
                *stored = profile.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn get(&self, id: &CardId) -> Result<Option<Profile>, StoreError> {
        Ok(self.cards.read().get(id).cloned())
    }

    fn exists(&self, id: &CardId) -> Result<bool, StoreError> {
        Ok(self.cards.read().contains_key(id))
    }

    fn delete(&self, id: &CardId) -> Result<(), StoreError> {
        self.cards.write().remove(id);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_profile(name: &str) -> Profile {
        Profile {
            name: name.to_string(),
            title: Some("Engineer".to_string()),
            company: None,
            phone: Some("+44 20 7946 0000".to_string()),
            email: format!("{}@example.com", name.to_lowercase()),
            profile_image: None,
            website: Some("https://example.com".to_string()),
            linkedin: None,
            twitter: Some("https://twitter.com/ada".to_string()),
        }
    }

    /// Behaviour every `CardStore` implementation must share.
    pub(crate) fn exercise_store(store: &dyn CardStore) {
        let id = CardId::from("card-1");
        assert!(!store.exists(&id).unwrap());
        assert!(store.get(&id).unwrap().is_none());

        let first = sample_profile("Ada");
        store.put(&id, &first).unwrap();
        assert!(store.exists(&id).unwrap());
        assert_eq!(store.get(&id).unwrap(), Some(first));

        // Upsert: last write wins.
        let second = sample_profile("Grace");
        store.put(&id, &second).unwrap();
        assert_eq!(store.get(&id).unwrap(), Some(second));

        // Replace only touches stored cards.
        let third = sample_profile("Linus");
        assert!(store.replace(&id, &third).unwrap());
        assert_eq!(store.get(&id).unwrap(), Some(third));
        let missing = CardId::from("card-2");
        assert!(!store.replace(&missing, &sample_profile("Ada")).unwrap());
        assert!(!store.exists(&missing).unwrap());

        // Exact-match keys only.
        assert!(!store.exists(&CardId::from("card-")).unwrap());
        assert!(!store.exists(&CardId::from("CARD-1")).unwrap());

        store.delete(&id).unwrap();
        assert!(!store.exists(&id).unwrap());
        store.delete(&id).unwrap();
    }

    #[test]
    fn memory_store_contract() {
        let store = MemoryStore::new();
        exercise_store(&store);
        assert!(store.is_empty());
    }

    #[test]
    fn memory_store_keeps_cards_separate() {
        let store = MemoryStore::new();
        store.put(&"a".into(), &sample_profile("Ada")).unwrap();
        store.put(&"b".into(), &sample_profile("Grace")).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&"a".into()).unwrap().unwrap().name, "Ada");
        assert_eq!(store.get(&"b".into()).unwrap().unwrap().name, "Grace");
    }

    #[test]
    fn generated_ids_are_unique() {
        let a = CardId::generate();
        let b = CardId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }
}
