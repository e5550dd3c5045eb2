use crate::error::StoreError;
use crate::occupancy::OccupancyState;
use async_trait::async_trait;
use futures::lock::Mutex;
use std::sync::Arc;

/// Durable whole-state storage of the room occupancy.
///
/// Implementations always hold the complete current state; callers express a
/// change by saving the entire state again.
#[async_trait]
pub trait OccupancyStore: Send + Sync {
    /// Loads the current state.
    ///
    /// A missing or unparseable backing document yields an empty state.
    /// Other I/O faults are returned as errors.
    async fn load(&self) -> std::result::Result<OccupancyState, StoreError>;

    /// Replaces the stored state with `state`.
    ///
    /// A later [`load`](Self::load) sees either the previous or the new state,
    /// never a partial write.
    async fn save(&self, state: &OccupancyState) -> std::result::Result<(), StoreError>;

    /// Lock guarding the backing document.
    ///
    /// Every handle on the same document must return the same lock.
    /// [`AccessCheckService`](crate::AccessCheckService) holds it across each
    /// load, decide, save cycle, so services built over separate handles of
    /// one document still exclude each other. `None` leaves serialization to
    /// each service instance.
    fn document_lock(&self) -> Option<Arc<Mutex<()>>> {
        None
    }
}

#[async_trait]
impl<T> OccupancyStore for Arc<T>
where
    T: OccupancyStore + ?Sized,
{
    async fn load(&self) -> std::result::Result<OccupancyState, StoreError> {
        (**self).load().await
    }

    async fn save(&self, state: &OccupancyState) -> std::result::Result<(), StoreError> {
        (**self).save(state).await
    }

    fn document_lock(&self) -> Option<Arc<Mutex<()>>> {
        (**self).document_lock()
    }
}
