use serde::{de::DeserializeOwned, Serialize};
use sled::Db;

use crate::account::store::Snapshot;
use crate::error::LodestoneError;

const ACCOUNT_PREFIX: &str = "account:";

pub struct Storage {
    db: Db,
}

impl Storage {
    pub fn open(path: &str) -> Result<Self, LodestoneError> {
        let db = sled::open(path).map_err(|e| LodestoneError::DatabaseError(e.to_string()))?;
        Ok(Storage { db })
    }

    /// In-memory database, dropped with the handle. Used by tests.
    pub fn temporary() -> Result<Self, LodestoneError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| LodestoneError::DatabaseError(e.to_string()))?;
        Ok(Storage { db })
    }

    // Generic Helper: Put
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), LodestoneError> {
        let serialized =
            bincode::serialize(value).map_err(|e| LodestoneError::SerializationError(e.to_string()))?;
        self.db
            .insert(key.as_bytes(), serialized)
            .map_err(|e| LodestoneError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    // Generic Helper: Get
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, LodestoneError> {
        match self.db.get(key.as_bytes()) {
            Ok(Some(data)) => {
                let deserialized = bincode::deserialize(&data)
                    .map_err(|e| LodestoneError::SerializationError(e.to_string()))?;
                Ok(Some(deserialized))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(LodestoneError::DatabaseError(e.to_string())),
        }
    }

    // --- Specific Accessors ---

    pub fn save_snapshot(&self, snapshot: &Snapshot) -> Result<(), LodestoneError> {
        self.put(
            &format!("{}{}", ACCOUNT_PREFIX, snapshot.record.id),
            snapshot,
        )
    }

    pub fn load_snapshot(&self, id: &str) -> Result<Option<Snapshot>, LodestoneError> {
        self.get(&format!("{}{}", ACCOUNT_PREFIX, id))
    }

    pub fn load_snapshots(&self) -> Result<Vec<Snapshot>, LodestoneError> {
        let mut snapshots = Vec::new();
        for entry in self.db.scan_prefix(ACCOUNT_PREFIX.as_bytes()) {
            let (_, data) = entry.map_err(|e| LodestoneError::DatabaseError(e.to_string()))?;
            let snapshot: Snapshot = bincode::deserialize(&data)
                .map_err(|e| LodestoneError::SerializationError(e.to_string()))?;
            snapshots.push(snapshot);
        }
        Ok(snapshots)
    }
}
