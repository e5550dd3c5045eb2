//! Access decisions and room occupancy for physical checkpoints.
//!
//! A checkpoint asks whether a key may enter or leave a room. The answer
//! depends on fixed input rules (room `1..=5`, key `1..=10000`, the room id
//! must divide the key id) and on where the key currently is. The crate keeps
//! the authoritative record of which keys are inside which rooms behind a
//! pluggable async store.
//!
//! Use [`evaluate`] for the pure decision and [`AccessCheckService`] to run a
//! full load, decide, save cycle against an [`OccupancyStore`].
//!
//! # Examples
//!
//! Running checks against the JSON file store (enabled by default through
//! `file-store`). The file store does its I/O through `tokio::fs`, so drive it
//! from a Tokio runtime:
//! ```
//! # #[cfg(feature = "file-store")]
//! # {
//! use rs_checkpoint::{AccessCheckService, CheckResult, Direction, FileStore};
//! # let dir = tempfile::tempdir().unwrap();
//! # let path = dir.path().join("rooms.json");
//! let service = AccessCheckService::new(FileStore::new(path));
//! let runtime = tokio::runtime::Builder::new_current_thread()
//!     .enable_all()
//!     .build()
//!     .unwrap();
//! let result = runtime.block_on(service.check(2, Direction::Entrance, 4));
//! assert_eq!(result, CheckResult::Allowed);
//! # }
//! ```
//!
//! Deciding without any storage:
//! ```
//! use rs_checkpoint::{AccessRequest, Decision, Direction, OccupancyState, evaluate};
//! let state = OccupancyState::new();
//! let evaluation = evaluate(&state, &AccessRequest::new(3, Direction::Entrance, 10)).unwrap();
//! assert_eq!(evaluation.decision(), Decision::Deny);
//! ```
#![forbid(unsafe_code)]

mod engine;
mod error;
mod occupancy;
mod service;
mod store;
mod types;
pub mod config;

#[cfg(feature = "file-store")]
mod file_store;

#[cfg(feature = "memory-store")]
mod memory_store;

#[cfg(feature = "axum")]
pub mod axum;

pub use crate::config::Config;
pub use crate::engine::{
    AccessRequest, Decision, Denial, Evaluation, Verdict, evaluate, validate,
};
pub use crate::error::{Error, Result, StoreError, ValidationFailure};
pub use crate::occupancy::OccupancyState;
pub use crate::service::{AccessCheckService, CheckResult};
pub use crate::store::OccupancyStore;
pub use crate::types::{Direction, KeyId, RoomId};

#[cfg(feature = "serde")]
pub use crate::occupancy::{OccupantRecord, RoomRecord};

#[cfg(feature = "file-store")]
pub use crate::file_store::{FileStore, FileStoreError};

#[cfg(feature = "memory-store")]
pub use crate::memory_store::MemoryStore;
