//! Versioned record envelope
//!
//! Every ledger is stored under its own key as
//! `{ "version": N, "data": { ... } }`. Only mutable progress goes into
//! `data`; static definitions (names, costs, icons) are rebuilt from code.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::platform::Storage;

/// Persistence failures. None of these are fatal to the game.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("storage refused write for key {0}")]
    StorageUnavailable(String),

    #[error("record {key} is not valid JSON: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("record {key} has schema version {found}, newest supported is {supported}")]
    UnsupportedVersion { key: String, found: u32, supported: u32 },

    #[error("failed to encode record {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// On-disk wrapper around a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub version: u32,
    pub data: T,
}

/// Serialize `data` into a versioned envelope and write it under `key`
pub fn save_record<T: Serialize>(
    storage: &mut dyn Storage,
    key: &str,
    version: u32,
    data: &T,
) -> Result<(), PersistError> {
    let json = serde_json::to_string(&Envelope { version, data }).map_err(|source| {
        PersistError::Encode {
            key: key.to_string(),
            source,
        }
    })?;
    if storage.set_item(key, &json) {
        Ok(())
    } else {
        Err(PersistError::StorageUnavailable(key.to_string()))
    }
}

/// Read the record under `key`.
///
/// `Ok(None)` means nothing was stored. Older versions are passed through
/// `migrate` before decoding; newer versions are rejected.
pub fn load_record<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
    version: u32,
    migrate: fn(u32, Value) -> Value,
) -> Result<Option<T>, PersistError> {
    let Some(json) = storage.get_item(key) else {
        return Ok(None);
    };

    let corrupt = |source| PersistError::Corrupt {
        key: key.to_string(),
        source,
    };

    let raw: Envelope<Value> = serde_json::from_str(&json).map_err(corrupt)?;
    if raw.version > version {
        return Err(PersistError::UnsupportedVersion {
            key: key.to_string(),
            found: raw.version,
            supported: version,
        });
    }

    let data = if raw.version < version {
        log::info!("Migrating {} from v{} to v{}", key, raw.version, version);
        migrate(raw.version, raw.data)
    } else {
        raw.data
    };

    serde_json::from_value(data).map(Some).map_err(corrupt)
}

/// A component whose mutable state is stored as one versioned record.
pub trait Persisted {
    /// Flat snapshot of the mutable fields
    type Record: Serialize + DeserializeOwned + Default;

    const STORAGE_KEY: &'static str;
    const VERSION: u32 = 1;

    fn to_record(&self) -> Self::Record;

    /// Replace mutable state with `record`, merged onto the static definitions.
    /// Entities absent from the record return to their default state.
    fn apply_record(&mut self, record: Self::Record);

    /// Upgrade an older record's JSON to the current shape
    fn migrate(_from_version: u32, data: Value) -> Value {
        data
    }

    fn save(&self, storage: &mut dyn Storage) -> Result<(), PersistError> {
        save_record(storage, Self::STORAGE_KEY, Self::VERSION, &self.to_record())
    }

    /// Load the stored record if there is one. Returns whether a record was applied;
    /// unreadable records are logged and leave the defaults in place.
    fn load(&mut self, storage: &dyn Storage) -> bool {
        match load_record::<Self::Record>(storage, Self::STORAGE_KEY, Self::VERSION, Self::migrate)
        {
            Ok(Some(record)) => {
                self.apply_record(record);
                true
            }
            Ok(None) => {
                self.apply_record(Self::Record::default());
                false
            }
            Err(e) => {
                log::warn!("Ignoring stored {}: {}", Self::STORAGE_KEY, e);
                self.apply_record(Self::Record::default());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStorage;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Counter {
        count: u32,
        label: String,
    }

    fn identity(_: u32, v: Value) -> Value {
        v
    }

    #[test]
    fn test_roundtrip() {
        let mut storage = MemoryStorage::new();
        let data = Counter {
            count: 3,
            label: "x".into(),
        };
        save_record(&mut storage, "k", 1, &data).unwrap();
        let back: Option<Counter> = load_record(&storage, "k", 1, identity).unwrap();
        assert_eq!(back, Some(data));
    }

    #[test]
    fn test_missing_record() {
        let storage = MemoryStorage::new();
        let back: Option<Counter> = load_record(&storage, "k", 1, identity).unwrap();
        assert!(back.is_none());
    }

    #[test]
    fn test_partial_record_merges_defaults() {
        let mut storage = MemoryStorage::new();
        storage.set_item("k", r#"{"version":1,"data":{"count":7}}"#);
        let back: Counter = load_record(&storage, "k", 1, identity).unwrap().unwrap();
        assert_eq!(back.count, 7);
        assert_eq!(back.label, "");
    }

    #[test]
    fn test_newer_version_rejected() {
        let mut storage = MemoryStorage::new();
        storage.set_item("k", r#"{"version":9,"data":{}}"#);
        let result = load_record::<Counter>(&storage, "k", 1, identity);
        assert!(matches!(result, Err(PersistError::UnsupportedVersion { found: 9, .. })));
    }

    #[test]
    fn test_corrupt_record() {
        let mut storage = MemoryStorage::new();
        storage.set_item("k", "{not json");
        let result = load_record::<Counter>(&storage, "k", 1, identity);
        assert!(matches!(result, Err(PersistError::Corrupt { .. })));
    }

    #[test]
    fn test_older_version_is_migrated() {
        fn rename(from: u32, mut v: Value) -> Value {
            if from == 0 {
                if let Some(n) = v.get("n").cloned() {
                    v["count"] = n;
                }
            }
            v
        }
        let mut storage = MemoryStorage::new();
        storage.set_item("k", r#"{"version":0,"data":{"n":4}}"#);
        let back: Counter = load_record(&storage, "k", 1, rename).unwrap().unwrap();
        assert_eq!(back.count, 4);
    }
}
