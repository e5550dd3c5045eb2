//! Axum integration utilities.
//!
//! Exposes `GET /check?roomId=<int>&entrance=<bool>&keyId=<int>`:
//! allowed answers `200`, denied answers `403`, and any fault answers `500`
//! without detail.

use std::sync::Arc;

use crate::service::{AccessCheckService, CheckResult};
use crate::store::OccupancyStore;
use crate::types::Direction;

use ::axum::Router;
use ::axum::extract::{Query, State};
use ::axum::http::StatusCode;
use ::axum::response::{IntoResponse, Response};
use ::axum::routing::get;

/// Query parameters of the check endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckParams {
    /// Requested room.
    pub room_id: i64,
    /// `true` to enter, `false` to leave.
    pub entrance: bool,
    /// Presented key.
    pub key_id: i64,
}

impl IntoResponse for CheckResult {
    fn into_response(self) -> Response {
        match self {
            CheckResult::Allowed => StatusCode::OK.into_response(),
            CheckResult::Denied => (StatusCode::FORBIDDEN, "forbidden").into_response(),
            CheckResult::Error => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}

/// Builds the checkpoint router around a shared service.
pub fn router<S>(service: Arc<AccessCheckService<S>>) -> Router
where
    S: OccupancyStore + 'static,
{
    Router::new()
        .route("/check", get(check::<S>))
        .with_state(service)
}

/// Handler for `GET /check`.
pub async fn check<S>(
    State(service): State<Arc<AccessCheckService<S>>>,
    Query(params): Query<CheckParams>,
) -> CheckResult
where
    S: OccupancyStore + 'static,
{
    service
        .check(params.room_id, Direction::from(params.entrance), params.key_id)
        .await
}
