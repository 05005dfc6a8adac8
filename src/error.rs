use thiserror::Error;

#[derive(Error, Debug)]
pub enum LodestoneError {
    #[error("Precondition violation: {0}")]
    PreconditionViolation(String),
    #[error("Stale snapshot: settled at version {committed}, caller read version {expected}")]
    StaleSnapshot { expected: u64, committed: u64 },
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Encoding error: {0}")]
    EncodingError(String),
    #[error("The {0} key is already bound")]
    AlreadyBound(&'static str),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),
}
