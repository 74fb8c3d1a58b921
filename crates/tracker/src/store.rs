//! Account lookup.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

/// An account as stored by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The id is not a 24-character hex object id.
    #[error("ObjectID not valid")]
    InvalidId,

    #[error("not found")]
    NotFound,
}

pub trait AccountStore: Send + Sync {
    fn get_account(&self, id: &str) -> Result<Account, StoreError>;
}

/// Whether `id` is a hex-encoded 12-byte object id.
pub fn is_object_id(id: &str) -> bool {
    id.len() == 24 && id.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Account store kept in memory, usually seeded from configuration.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: HashMap<String, Account>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_accounts(accounts: impl IntoIterator<Item = Account>) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for account in accounts {
            store.insert(account)?;
        }
        Ok(store)
    }

    /// Add or replace an account. Ids are matched case-insensitively.
    pub fn insert(&mut self, account: Account) -> Result<(), StoreError> {
        if !is_object_id(&account.id) {
            return Err(StoreError::InvalidId);
        }
        let key = account.id.to_ascii_lowercase();
        self.accounts.insert(key, account);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AccountStore for InMemoryAccountStore {
    fn get_account(&self, id: &str) -> Result<Account, StoreError> {
        if !is_object_id(id) {
            return Err(StoreError::InvalidId);
        }
        self.accounts
            .get(&id.to_ascii_lowercase())
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIVE: &str = "5a638e99ed12aa438f5fef20";

    fn account(id: &str, is_active: bool) -> Account {
        Account {
            id: id.to_string(),
            name: "Ale".to_string(),
            is_active,
        }
    }

    #[test]
    fn object_id_validation() {
        assert!(is_object_id(ACTIVE));
        assert!(is_object_id("5A638E99ED12AA438F5FEF20"));
        assert!(!is_object_id(""));
        assert!(!is_object_id("test"));
        assert!(!is_object_id("5a638e99ed12aa438f5fef2"));
        assert!(!is_object_id("5a638e99ed12aa438f5fef2g"));
    }

    #[test]
    fn lookups() {
        let store = InMemoryAccountStore::from_accounts([account(ACTIVE, true)]).unwrap();

        assert_eq!(store.get_account(ACTIVE), Ok(account(ACTIVE, true)));
        assert_eq!(
            store.get_account(&ACTIVE.to_uppercase()).map(|a| a.is_active),
            Ok(true)
        );
        assert_eq!(store.get_account("test"), Err(StoreError::InvalidId));
        assert_eq!(
            store.get_account("000000000000000000000000"),
            Err(StoreError::NotFound)
        );
    }

    #[test]
    fn insert_replaces_and_counts_accounts() {
        let mut store = InMemoryAccountStore::new();
        assert!(store.is_empty());

        store.insert(account(ACTIVE, false)).unwrap();
        store.insert(account(&ACTIVE.to_uppercase(), true)).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_account(ACTIVE).map(|a| a.is_active), Ok(true));

        assert_eq!(store.insert(account("nope", true)), Err(StoreError::InvalidId));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn rejects_invalid_seed_ids() {
        let err = InMemoryAccountStore::from_accounts([account("nope", true)]).unwrap_err();
        assert_eq!(err, StoreError::InvalidId);
        assert_eq!(err.to_string(), "ObjectID not valid");
    }
}
