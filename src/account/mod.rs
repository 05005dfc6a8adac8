//! Identity-anchor account: the persisted record, the signature-gated
//! transition engine, and the versioned store that settles transitions.

pub mod engine;
pub mod store;
pub mod types;

pub use engine::Applied;
pub use store::{AccountStore, Snapshot};
pub use types::{AccountEvent, AccountId, AccountRecord, Phase, PublicKeyHex, Transition};
