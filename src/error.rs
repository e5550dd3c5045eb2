use crate::types::{KeyId, RoomId};
use thiserror::Error;

/// Store-layer error type.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Crate result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by this crate.
///
/// None of these reach a checkpoint caller directly: the service reports
/// every one of them as [`CheckResult::Error`](crate::CheckResult::Error).
#[derive(Debug, Error)]
pub enum Error {
    /// Backing document could not be read or written.
    #[error("store error: {0}")]
    Store(#[source] StoreError),
    /// Occupancy state breaks one of its invariants.
    #[error("occupancy invariant violated: {0}")]
    InvariantViolation(String),
    /// Unexpected fault caught at the service boundary.
    #[error("internal error: {0}")]
    Internal(String),
    /// Invalid process configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<StoreError> for Error {
    fn from(error: StoreError) -> Self {
        // Backends may box a crate error to report a corrupt document.
        match error.downcast::<Error>() {
            Ok(inner) => *inner,
            Err(error) => Self::Store(error),
        }
    }
}

/// Request rejected by an input rule before any state is inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// Room id outside `1..=5`.
    #[error("room id {0} is outside [{min}, {max}]", min = RoomId::MIN, max = RoomId::MAX)]
    RoomOutOfRange(i64),
    /// Key id outside `1..=10000`.
    #[error("key id {0} is outside [{min}, {max}]", min = KeyId::MIN, max = KeyId::MAX)]
    KeyOutOfRange(i64),
    /// Key id is not a multiple of the room id.
    #[error("key id {key} is not divisible by room id {room}")]
    NotDivisible { room: RoomId, key: KeyId },
}
