use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::db::Database;
use crate::error::Error;
use crate::events::LiftEvent;
use crate::models::*;
use crate::progression;

// ============================================================
// Error Handling
// ============================================================

/// Map a store error to a response.
///
/// Request problems are returned to the client as-is. Anything else is logged
/// and replaced by a generic message so storage details stay server-side.
fn error_response(e: Error) -> (StatusCode, String) {
    match e {
        Error::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        e if e.is_client_error() => {
            tracing::warn!("Validation error: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        e => {
            tracing::error!("Internal error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

fn lift_not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Lift not found".to_string())
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Lifts
// ============================================================

pub async fn list_lifts(
    State(db): State<Database>,
) -> Result<Json<Vec<Lift>>, (StatusCode, String)> {
    db.get_all_lifts().map(Json).map_err(error_response)
}

pub async fn get_lift(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Lift>, (StatusCode, String)> {
    db.get_lift(id)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(lift_not_found)
}

pub async fn create_lift(
    State(db): State<Database>,
    Json(input): Json<CreateLiftInput>,
) -> Result<(StatusCode, Json<Lift>), (StatusCode, String)> {
    db.create_lift(input)
        .map(|l| (StatusCode::CREATED, Json(l)))
        .map_err(error_response)
}

pub async fn update_lift(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateLiftInput>,
) -> Result<Json<Lift>, (StatusCode, String)> {
    db.update_lift(id, input)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(lift_not_found)
}

pub async fn delete_lift(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_lift(id).map_err(error_response)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(lift_not_found())
    }
}

pub async fn get_lift_history(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Lift>>, (StatusCode, String)> {
    db.get_lift_history(id)
        .map_err(error_response)?
        .map(Json)
        .ok_or_else(lift_not_found)
}

/// Generate the next lift of a top-set progression.
pub async fn create_next_lift(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Lift>), (StatusCode, String)> {
    db.create_next_top_set_lift(id)
        .map(|l| (StatusCode::CREATED, Json(l)))
        .map_err(error_response)
}

// ============================================================
// Sets
// ============================================================

pub async fn add_set(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateSetInput>,
) -> Result<(StatusCode, Json<LiftSet>), (StatusCode, String)> {
    db.add_set(id, input)
        .map(|s| (StatusCode::CREATED, Json(s)))
        .map_err(error_response)
}

pub async fn record_set(
    State(db): State<Database>,
    Path((id, index)): Path<(Uuid, u32)>,
    Json(input): Json<RecordSetInput>,
) -> Result<Json<LiftSet>, (StatusCode, String)> {
    db.record_set(id, index, input)
        .map(Json)
        .map_err(error_response)
}

#[derive(Debug, Deserialize)]
pub struct NextWeightQuery {
    /// Defaults to [`progression::DEFAULT_PERCENT`].
    pub percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextWeightResponse {
    pub lift_id: Uuid,
    pub set_index: u32,
    pub current_weight: f64,
    pub percent: f64,
    pub next_weight: f64,
}

/// Suggest the next target weight for a set, moving from its current target.
pub async fn suggest_next_weight(
    State(db): State<Database>,
    Path((id, index)): Path<(Uuid, u32)>,
    Query(query): Query<NextWeightQuery>,
) -> Result<Json<NextWeightResponse>, (StatusCode, String)> {
    let lift = db
        .get_lift(id)
        .map_err(error_response)?
        .ok_or_else(lift_not_found)?;
    let set = lift
        .sets
        .iter()
        .find(|s| s.set_index == index)
        .ok_or((StatusCode::NOT_FOUND, "Set not found".to_string()))?;

    let step = lift.weight_step.ok_or_else(|| {
        error_response(Error::InvalidState(format!(
            "lift {} has no weight step",
            lift.id
        )))
    })?;
    let current_weight = set.target_weight.ok_or_else(|| {
        error_response(Error::InvalidState(format!(
            "set {} has no target weight",
            index
        )))
    })?;
    let percent = query.percent.unwrap_or(progression::DEFAULT_PERCENT);
    let next_weight =
        progression::next_weight(current_weight, step, percent).map_err(error_response)?;

    Ok(Json(NextWeightResponse {
        lift_id: lift.id,
        set_index: index,
        current_weight,
        percent,
        next_weight,
    }))
}

// ============================================================
// Events
// ============================================================

/// Stream `lift:save` and `lift:remove` events as server-sent events.
pub async fn lift_events(
    State(db): State<Database>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    Sse::new(lift_event_stream(db.subscribe())).keep_alive(KeepAlive::default())
}

/// Turn bus events into SSE frames named after the event, with the lift as
/// JSON data. A lagging subscriber skips what it missed and keeps going.
fn lift_event_stream(
    rx: broadcast::Receiver<LiftEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => match Event::default().event(event.name()).json_data(event.lift()) {
                    Ok(sse) => return Some((Ok::<_, Infallible>(sse), rx)),
                    Err(e) => tracing::warn!("Failed to encode lift event: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}
