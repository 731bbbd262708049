//! Handlers for `/duties` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/duties` | all duties with status histories |
//! | `POST`   | `/duties` | body: `NewDuty`; 400 on validation failure |
//! | `GET`    | `/duties/:id` | 404 if not found |
//! | `PUT`    | `/duties/:id` | body: `DutyPatch`; bypasses eligibility |
//! | `DELETE` | `/duties/:id` | 409 when the duty is scheduled |
//! | `PUT`    | `/duties/:id/cancel` | 409 when already canceled |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use rota_core::{
  duty::{Duty, DutyPatch, DutyStatus, NewDuty},
  store::RosterStore,
};
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /duties`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Duty>>, ApiError>
where
  S: RosterStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let duties = store.list_duties().await.map_err(ApiError::store)?;
  Ok(Json(duties))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /duties` — validation failures (time ordering, rank window,
/// headcount) come back as 400.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewDuty>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RosterStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  // Validate up front so the store's own rejection of the same input is
  // never surfaced as a 500.
  body.clone().build(chrono::Utc::now()).map_err(|e| {
    ApiError::BadRequest(e.to_string())
  })?;

  let duty = store.add_duty(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(duty)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /duties/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Duty>, ApiError>
where
  S: RosterStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let duty = store
    .get_duty(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("duty {id} not found")))?;
  Ok(Json(duty))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /duties/:id` — a direct update bypasses eligibility checks
/// entirely, including edits to the assignment list and status.
pub async fn update_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(patch): Json<DutyPatch>,
) -> Result<Json<Duty>, ApiError>
where
  S: RosterStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let duty = store
    .update_duty(id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("duty {id} not found")))?;
  Ok(Json(duty))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /duties/:id`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: RosterStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let duty = store
    .get_duty(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("duty {id} not found")))?;
  if duty.status == DutyStatus::Scheduled {
    return Err(ApiError::Conflict(format!(
      "duty {id} is scheduled; cancel it before deleting"
    )));
  }

  store.delete_duty(id).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Cancel ───────────────────────────────────────────────────────────────────

/// `PUT /duties/:id/cancel`
pub async fn cancel_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Duty>, ApiError>
where
  S: RosterStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let duty = store
    .get_duty(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("duty {id} not found")))?;
  if duty.status == DutyStatus::Canceled {
    return Err(ApiError::Conflict(format!("duty {id} is already canceled")));
  }

  let canceled = store
    .cancel_duty(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("duty {id} not found")))?;
  Ok(Json(canceled))
}
