use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use settings_core::{CredentialStore, SettingsError, languages::storage_key};
use thiserror::Error;
use tracing::debug;

mod file_storage;

pub use file_storage::FileStorage;

/// Keys the settings pages persist locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Session token used to authenticate API and socket traffic.
    UserToken,
    /// Selected UI language, stored with `_` separators.
    AppLanguage,
}

impl StorageKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserToken => "userToken",
            Self::AppLanguage => "appLanguage",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<StorageError> for SettingsError {
    fn from(err: StorageError) -> Self {
        SettingsError::storage(err.to_string())
    }
}

/// String key/value storage that survives restarts.
pub trait LocalStorage: Send + Sync {
    fn get_string(&self, key: StorageKey) -> Result<Option<String>, StorageError>;

    fn set_string(&self, key: StorageKey, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: StorageKey) -> Result<(), StorageError>;
}

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    data: Arc<RwLock<HashMap<StorageKey, String>>>,
}

impl LocalStorage for InMemoryStorage {
    fn get_string(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        let data = self
            .data
            .read()
            .map_err(|_| StorageError::Backend("poisoned lock".to_owned()))?;
        Ok(data.get(&key).cloned())
    }

    fn set_string(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        let mut data = self
            .data
            .write()
            .map_err(|_| StorageError::Backend("poisoned lock".to_owned()))?;
        data.insert(key, value.to_owned());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        let mut data = self
            .data
            .write()
            .map_err(|_| StorageError::Backend("poisoned lock".to_owned()))?;
        data.remove(&key);
        Ok(())
    }
}

#[cfg(feature = "os-keyring")]
#[derive(Clone)]
pub struct OsKeyringStorage {
    service: String,
}

#[cfg(feature = "os-keyring")]
impl OsKeyringStorage {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: StorageKey) -> Result<keyring::Entry, StorageError> {
        keyring::Entry::new(&self.service, key.as_str())
            .map_err(|err| StorageError::Backend(err.to_string()))
    }
}

#[cfg(feature = "os-keyring")]
impl LocalStorage for OsKeyringStorage {
    fn get_string(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(other) => Err(StorageError::Backend(other.to_string())),
        }
    }

    fn set_string(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        self.entry(key)?
            .set_password(value)
            .map_err(|err| StorageError::Backend(err.to_string()))
    }

    fn remove(&self, key: StorageKey) -> Result<(), StorageError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(other) => Err(StorageError::Backend(other.to_string())),
        }
    }
}

/// Persists rotated session tokens under [`StorageKey::UserToken`].
#[derive(Clone)]
pub struct StoredCredentials<S: LocalStorage> {
    inner: S,
}

impl<S: LocalStorage> StoredCredentials<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn token(&self) -> Result<Option<String>, StorageError> {
        self.inner.get_string(StorageKey::UserToken)
    }
}

impl<S: LocalStorage> CredentialStore for StoredCredentials<S> {
    fn persist_token(&self, token: &str) -> Result<(), SettingsError> {
        debug!("persisting session token");
        self.inner
            .set_string(StorageKey::UserToken, token)
            .map_err(SettingsError::from)
    }
}

/// Stored UI language key (`en_gb` form), if any.
pub fn current_language<S: LocalStorage + ?Sized>(
    storage: &S,
) -> Result<Option<String>, StorageError> {
    Ok(storage
        .get_string(StorageKey::AppLanguage)?
        .map(|key| storage_key(&key)))
}

pub fn set_current_language<S: LocalStorage + ?Sized>(
    storage: &S,
    key: &str,
) -> Result<(), StorageError> {
    storage.set_string(StorageKey::AppLanguage, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use settings_core::SettingsErrorCategory;

    #[test]
    fn in_memory_roundtrip() {
        let storage = InMemoryStorage::default();
        storage
            .set_string(StorageKey::UserToken, "t-1")
            .expect("set should work");
        assert_eq!(
            storage
                .get_string(StorageKey::UserToken)
                .expect("get should work")
                .as_deref(),
            Some("t-1")
        );

        storage.remove(StorageKey::UserToken).expect("remove should work");
        storage
            .remove(StorageKey::UserToken)
            .expect("second remove should be a no-op");
        assert_eq!(storage.get_string(StorageKey::UserToken), Ok(None));
    }

    #[test]
    fn stored_credentials_write_user_token() {
        let storage = InMemoryStorage::default();
        let credentials = StoredCredentials::new(storage.clone());

        credentials.persist_token("rotated").expect("persist should work");

        assert_eq!(
            storage.get_string(StorageKey::UserToken),
            Ok(Some("rotated".to_owned()))
        );
        assert_eq!(credentials.token(), Ok(Some("rotated".to_owned())));
    }

    #[test]
    fn language_preference_is_read_with_underscores() {
        let storage = InMemoryStorage::default();
        assert_eq!(current_language(&storage), Ok(None));

        set_current_language(&storage, "hu-hu").expect("set should work");
        assert_eq!(current_language(&storage), Ok(Some("hu_hu".to_owned())));
    }

    #[derive(Default)]
    struct FailingStorage;

    impl LocalStorage for FailingStorage {
        fn get_string(&self, _key: StorageKey) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("mock outage".to_owned()))
        }

        fn set_string(&self, _key: StorageKey, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("mock outage".to_owned()))
        }

        fn remove(&self, _key: StorageKey) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("mock outage".to_owned()))
        }
    }

    #[test]
    fn storage_failure_becomes_settings_storage_error() {
        let credentials = StoredCredentials::new(FailingStorage);
        let err = credentials
            .persist_token("t")
            .expect_err("persist must fail");
        assert_eq!(err.category, SettingsErrorCategory::Storage);
        assert!(err.message.contains("mock outage"));
    }
}
