//! Versioned account storage with compare-and-swap settlement.
//!
//! Reads hand out a `Snapshot` carrying the commit version; `settle` is the
//! optimistic write: it applies only if the version is unchanged and fails
//! closed otherwise. `submit` composes snapshot, engine validation and
//! settlement into one serial read-verify-write.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::engine::{self, Applied};
use super::types::{AccountEvent, AccountId, AccountRecord, PublicKeyHex, Transition};
use crate::encoding::ControllerId;
use crate::error::LodestoneError;
use crate::storage::Storage;

/// A committed record together with its commit version.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub version: u64,
    pub record: AccountRecord,
}

/// Account store for the anchored records
pub struct AccountStore {
    accounts: HashMap<AccountId, Snapshot>,

    storage: Option<Arc<Storage>>,
}

impl AccountStore {
    /// Create a new empty account store
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            storage: None,
        }
    }

    /// Create with a storage backend, restoring any persisted snapshots
    pub fn with_storage(storage: Arc<Storage>) -> Result<Self, LodestoneError> {
        let mut accounts = HashMap::new();
        for snapshot in storage.load_snapshots()? {
            accounts.insert(snapshot.record.id.clone(), snapshot);
        }
        Ok(Self {
            accounts,
            storage: Some(storage),
        })
    }

    /// Create a fresh record: owner and oracle unset, controller and
    /// attribute absent, nonce zero.
    pub fn create_account(&mut self, id: &str) -> Result<Snapshot, LodestoneError> {
        if self.accounts.contains_key(id) {
            return Err(LodestoneError::AccountAlreadyExists(id.to_string()));
        }
        let snapshot = Snapshot {
            version: 0,
            record: AccountRecord::new(id),
        };
        if let Some(storage) = &self.storage {
            storage.save_snapshot(&snapshot)?;
        }
        self.accounts.insert(id.to_string(), snapshot.clone());
        info!("Created account '{}'", id);
        Ok(snapshot)
    }

    /// Restore an existing record or create it on first run
    pub fn open_or_create(&mut self, id: &str) -> Result<Snapshot, LodestoneError> {
        match self.snapshot(id) {
            Ok(snapshot) => Ok(snapshot),
            Err(LodestoneError::AccountNotFound(_)) => self.create_account(id),
            Err(e) => Err(e),
        }
    }

    /// Point-in-time read of the committed record and its version
    pub fn snapshot(&self, id: &str) -> Result<Snapshot, LodestoneError> {
        self.accounts
            .get(id)
            .cloned()
            .ok_or_else(|| LodestoneError::AccountNotFound(id.to_string()))
    }

    /// Compare-and-swap commit. Applies `record` only if the committed
    /// version still equals `expected_version`; fails closed otherwise.
    pub fn settle(
        &mut self,
        id: &str,
        expected_version: u64,
        record: AccountRecord,
    ) -> Result<Snapshot, LodestoneError> {
        let entry = self
            .accounts
            .get_mut(id)
            .ok_or_else(|| LodestoneError::AccountNotFound(id.to_string()))?;
        if entry.version != expected_version {
            return Err(LodestoneError::StaleSnapshot {
                expected: expected_version,
                committed: entry.version,
            });
        }

        let next = Snapshot {
            version: entry.version + 1,
            record,
        };
        // Persist before the in-memory swap so a storage failure leaves the
        // committed state untouched
        if let Some(storage) = &self.storage {
            storage.save_snapshot(&next)?;
        }
        *entry = next.clone();
        Ok(next)
    }

    /// One serial read-verify-write: snapshot, engine validation, settle.
    pub fn submit(
        &mut self,
        id: &str,
        transition: &Transition,
    ) -> Result<(Snapshot, Option<AccountEvent>), LodestoneError> {
        let snapshot = self.snapshot(id)?;
        debug!(
            "submit {} against '{}' v{} nonce {}",
            transition.name(),
            id,
            snapshot.version,
            snapshot.record.nonce
        );
        let Applied { record, event } = engine::apply(&snapshot.record, transition)?;
        let committed = self.settle(id, snapshot.version, record)?;
        info!(
            "{} settled on '{}' at nonce {}",
            transition.name(),
            id,
            committed.record.nonce
        );
        Ok((committed, event))
    }

    // --- Point reads ---

    pub fn owner(&self, id: &str) -> Result<Option<PublicKeyHex>, LodestoneError> {
        Ok(self.snapshot(id)?.record.owner)
    }

    pub fn oracle(&self, id: &str) -> Result<Option<PublicKeyHex>, LodestoneError> {
        Ok(self.snapshot(id)?.record.oracle)
    }

    pub fn controller(&self, id: &str) -> Result<Option<ControllerId>, LodestoneError> {
        Ok(self.snapshot(id)?.record.controller)
    }

    pub fn attribute(&self, id: &str) -> Result<Option<u64>, LodestoneError> {
        Ok(self.snapshot(id)?.record.attribute)
    }

    pub fn nonce(&self, id: &str) -> Result<u64, LodestoneError> {
        Ok(self.snapshot(id)?.record.nonce)
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::engine::{bind_oracle_message, set_controller_message};
    use crate::crypto::KeyPair;

    #[test]
    fn create_then_snapshot() {
        let mut store = AccountStore::new();
        store.create_account("anchor-1").unwrap();

        let snapshot = store.snapshot("anchor-1").unwrap();
        assert_eq!(snapshot.version, 0);
        assert_eq!(snapshot.record.nonce, 0);
        assert!(store.create_account("anchor-1").is_err());
        assert!(matches!(
            store.snapshot("missing"),
            Err(LodestoneError::AccountNotFound(_))
        ));
    }

    #[test]
    fn settle_fails_closed_on_stale_version() {
        let owner = KeyPair::new();
        let mut store = AccountStore::new();
        store.create_account("anchor-1").unwrap();

        // Two callers read the same snapshot
        let first = store.snapshot("anchor-1").unwrap();
        let second = first.clone();

        let mut record_a = first.record.clone();
        record_a.owner = Some(owner.public_key_hex());
        record_a.nonce += 1;
        store.settle("anchor-1", first.version, record_a).unwrap();

        // The loser's write must not clobber the winner's
        let mut record_b = second.record;
        record_b.owner = Some(KeyPair::new().public_key_hex());
        record_b.nonce += 1;
        let result = store.settle("anchor-1", second.version, record_b);
        assert!(matches!(
            result,
            Err(LodestoneError::StaleSnapshot {
                expected: 0,
                committed: 1
            })
        ));
        assert_eq!(store.owner("anchor-1").unwrap(), Some(owner.public_key_hex()));
    }

    #[test]
    fn submit_advances_version_and_nonce() {
        let owner = KeyPair::new();
        let mut store = AccountStore::new();
        store.create_account("anchor-1").unwrap();

        let (committed, event) = store
            .submit(
                "anchor-1",
                &Transition::ClaimOwner {
                    new_owner: owner.public_key_hex(),
                },
            )
            .unwrap();
        assert_eq!(committed.version, 1);
        assert_eq!(committed.record.nonce, 1);
        assert_eq!(event, None);
        assert_eq!(store.nonce("anchor-1").unwrap(), 1);
    }

    #[test]
    fn rejected_submit_leaves_state_untouched() {
        let owner = KeyPair::new();
        let mut store = AccountStore::new();
        store.create_account("anchor-1").unwrap();
        store
            .submit(
                "anchor-1",
                &Transition::ClaimOwner {
                    new_owner: owner.public_key_hex(),
                },
            )
            .unwrap();
        let before = store.snapshot("anchor-1").unwrap();

        let result = store.submit(
            "anchor-1",
            &Transition::ClaimOwner {
                new_owner: KeyPair::new().public_key_hex(),
            },
        );
        assert!(result.is_err());
        assert_eq!(store.snapshot("anchor-1").unwrap(), before);
    }

    #[test]
    fn oracle_binding_reports_event() {
        let owner = KeyPair::new();
        let oracle = KeyPair::new();
        let mut store = AccountStore::new();
        store.create_account("anchor-1").unwrap();
        store
            .submit(
                "anchor-1",
                &Transition::ClaimOwner {
                    new_owner: owner.public_key_hex(),
                },
            )
            .unwrap();

        let nonce = store.nonce("anchor-1").unwrap();
        let message = bind_oracle_message(&oracle.public_key_hex(), nonce).unwrap();
        let (_, event) = store
            .submit(
                "anchor-1",
                &Transition::BindOracle {
                    new_oracle: oracle.public_key_hex(),
                    owner_signature: owner.sign_hex(&message),
                },
            )
            .unwrap();
        assert_eq!(
            event,
            Some(AccountEvent::OracleBound {
                account: "anchor-1".to_string(),
                oracle: oracle.public_key_hex(),
            })
        );
    }

    #[test]
    fn snapshots_survive_a_restart() {
        let owner = KeyPair::new();
        let storage = Arc::new(Storage::temporary().unwrap());

        {
            let mut store = AccountStore::with_storage(storage.clone()).unwrap();
            store.create_account("anchor-1").unwrap();
            store
                .submit(
                    "anchor-1",
                    &Transition::ClaimOwner {
                        new_owner: owner.public_key_hex(),
                    },
                )
                .unwrap();
            let ctrl = ControllerId::new("abc").unwrap();
            let message = set_controller_message(&ctrl);
            store
                .submit(
                    "anchor-1",
                    &Transition::SetController {
                        controller: ctrl,
                        owner_signature: owner.sign_hex(&message),
                    },
                )
                .unwrap();
        }

        let store = AccountStore::with_storage(storage).unwrap();
        let snapshot = store.snapshot("anchor-1").unwrap();
        assert_eq!(snapshot.version, 2);
        assert_eq!(snapshot.record.owner, Some(owner.public_key_hex()));
        assert_eq!(
            snapshot.record.controller,
            Some(ControllerId::new("abc").unwrap())
        );
    }
}
