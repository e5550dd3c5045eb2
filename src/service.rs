use crate::engine::{AccessRequest, Denial, Evaluation, Verdict, evaluate};
use crate::error::{Error, Result};
use crate::store::OccupancyStore;
use crate::types::Direction;
use futures::FutureExt;
use futures::lock::Mutex;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use tracing::{error, info, trace, warn};

/// Result reported to a checkpoint caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckResult {
    /// The door may open; the movement has been persisted.
    Allowed,
    /// The door stays closed.
    Denied,
    /// The check could not be completed; nothing was persisted.
    Error,
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allowed => "allowed",
            Self::Denied => "denied",
            Self::Error => "error",
        })
    }
}

/// Runs checkpoint requests against an [`OccupancyStore`].
///
/// Each check is one load, decide, save cycle. Cycles are serialized on the
/// store's [`document_lock`](OccupancyStore::document_lock), so every service
/// over the same document takes turns. Stores without one fall back to a lock
/// owned by the service, and then one service instance must own the document.
pub struct AccessCheckService<S> {
    store: S,
    serial: Mutex<()>,
}

impl<S: fmt::Debug> fmt::Debug for AccessCheckService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessCheckService")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<S> AccessCheckService<S> {
    /// Creates a service over `store`.
    pub fn new(store: S) -> Self {
        Self {
            store,
            serial: Mutex::new(()),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> AccessCheckService<S>
where
    S: OccupancyStore,
{
    /// Checks whether `key` may move through the door of `room`.
    ///
    /// Never fails: every fault is logged and reported as [`CheckResult::Error`].
    pub async fn check(&self, room: i64, direction: Direction, key: i64) -> CheckResult {
        self.check_request(AccessRequest::new(room, direction, key))
            .await
    }

    /// Same as [`check`](Self::check) for a prepared request.
    pub async fn check_request(&self, request: AccessRequest) -> CheckResult {
        info!(
            room = request.room,
            key = request.key,
            direction = %request.direction,
            "access attempt"
        );

        let outcome = AssertUnwindSafe(self.check_detailed(request))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(Error::Internal(panic_message(&*panic))));

        let result = match outcome {
            Ok(evaluation) => {
                // validation failures never look the key up
                if !matches!(evaluation.verdict, Verdict::Deny(Denial::Invalid(_))) {
                    match evaluation.current_room {
                        Some(current) => {
                            info!(key = request.key, current_room = %current, "key located");
                        }
                        None => info!(key = request.key, "key is not inside any room"),
                    }
                }
                match evaluation.verdict {
                    Verdict::Allow(_) => CheckResult::Allowed,
                    Verdict::Deny(Denial::Invalid(failure)) => {
                        warn!(
                            room = request.room,
                            key = request.key,
                            rule = %failure,
                            "request failed validation"
                        );
                        CheckResult::Denied
                    }
                    Verdict::Deny(denial) => {
                        info!(
                            room = request.room,
                            key = request.key,
                            reason = %denial,
                            "access denied"
                        );
                        CheckResult::Denied
                    }
                }
            }
            Err(err) => {
                error!(
                    room = request.room,
                    key = request.key,
                    error = %err,
                    "access check failed"
                );
                CheckResult::Error
            }
        };

        info!(
            room = request.room,
            key = request.key,
            direction = %request.direction,
            result = %result,
            "access check finished"
        );
        result
    }

    /// Runs one load, decide, save cycle and returns the typed outcome.
    ///
    /// The new state is saved before this returns an allowing evaluation; a
    /// failed save is returned as an error instead.
    pub async fn check_detailed(&self, request: AccessRequest) -> Result<Evaluation> {
        let shared = self.store.document_lock();
        let _serial = match &shared {
            Some(lock) => lock.lock().await,
            None => self.serial.lock().await,
        };

        trace!("loading occupancy");
        let state = self.store.load().await.map_err(Error::from)?;
        trace!(occupants = state.len(), "occupancy loaded");

        let evaluation = evaluate(&state, &request)?;

        if let Verdict::Allow(next) = &evaluation.verdict {
            trace!("saving occupancy");
            self.store.save(next).await.map_err(Error::from)?;
            trace!(occupants = next.len(), "occupancy saved");
        }

        Ok(evaluation)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic while checking access".to_string()
    }
}
