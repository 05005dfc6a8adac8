//! Account record and transition types.
//!
//! Absence is explicit: an unset owner, oracle, controller or attribute is
//! `None`, never a zero sentinel. The all-zero limb pair exists only on the
//! wire (see `encoding`).

use serde::{Deserialize, Serialize};

use crate::encoding::ControllerId;

/// Account identifier - short human-readable name
pub type AccountId = String;

/// Hex-encoded Ed25519 public key
pub type PublicKeyHex = String;

/// The persisted account record. Mutated only through `engine::apply`;
/// there is no deletion path.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AccountRecord {
    pub id: AccountId,
    pub owner: Option<PublicKeyHex>,
    pub oracle: Option<PublicKeyHex>,
    pub controller: Option<ControllerId>,
    pub attribute: Option<u64>,
    /// Ledger-maintained counter, advanced by every applied transition.
    pub nonce: u64,
}

impl AccountRecord {
    pub fn new(id: impl Into<AccountId>) -> Self {
        Self {
            id: id.into(),
            owner: None,
            oracle: None,
            controller: None,
            attribute: None,
            nonce: 0,
        }
    }

    pub fn has_owner(&self) -> bool {
        self.owner.is_some()
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    pub fn phase(&self) -> Phase {
        match (self.has_owner(), self.has_oracle()) {
            (false, _) => Phase::Uninitialized,
            (true, false) => Phase::OwnerOnly,
            (true, true) => Phase::OracleBound,
        }
    }
}

/// Lifecycle of the identity keys. `OracleBound` is terminal for owner and
/// oracle; controller and attribute stay mutable within it.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    OwnerOnly,
    OracleBound,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Uninitialized => write!(f, "uninitialized"),
            Phase::OwnerOnly => write!(f, "owner-only"),
            Phase::OracleBound => write!(f, "oracle-bound"),
        }
    }
}

/// The closed menu of account operations. Exhaustive matching in the engine
/// keeps a missing case a compile error rather than a runtime gap.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum Transition {
    /// Claim the owner slot. First come, only once, no signature.
    ClaimOwner { new_owner: PublicKeyHex },
    /// Bind the trusted oracle. Owner-signed over `new_oracle || nonce`.
    BindOracle {
        new_oracle: PublicKeyHex,
        owner_signature: String,
    },
    /// Replace the controller as the owner. Owner-signed over the new limbs.
    SetController {
        controller: ControllerId,
        owner_signature: String,
    },
    /// Replace the controller as the oracle, bound to the value the oracle
    /// believed current. Oracle-signed over `new || prior || nonce`.
    UpdateController {
        controller: ControllerId,
        prior_controller: Option<ControllerId>,
        oracle_signature: String,
    },
    /// Attest the numeric attribute. Oracle-signed over `value || account id`.
    SetAttribute { value: u64, oracle_signature: String },
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::ClaimOwner { .. } => "claimOwner",
            Transition::BindOracle { .. } => "bindOracle",
            Transition::SetController { .. } => "setController",
            Transition::UpdateController { .. } => "updateController",
            Transition::SetAttribute { .. } => "setAttribute",
        }
    }
}

/// Best-effort observer notification. Not required for correctness.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum AccountEvent {
    OracleBound {
        account: AccountId,
        oracle: PublicKeyHex,
    },
}
