//! Handlers for `/soldiers` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/soldiers` | full roster |
//! | `POST`   | `/soldiers` | body: `NewSoldier`; 409 on duplicate id |
//! | `GET`    | `/soldiers/:id` | 404 if not found |
//! | `PUT`    | `/soldiers/:id` | body: `SoldierPatch` |
//! | `DELETE` | `/soldiers/:id` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use rota_core::{
  soldier::{NewSoldier, Soldier, SoldierId, SoldierPatch},
  store::RosterStore,
};

use crate::error::ApiError;

fn parse_id(raw: &str) -> Result<SoldierId, ApiError> {
  SoldierId::new(raw).map_err(|e| ApiError::BadRequest(e.to_string()))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /soldiers`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Soldier>>, ApiError>
where
  S: RosterStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let soldiers = store.list_soldiers().await.map_err(ApiError::store)?;
  Ok(Json(soldiers))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /soldiers`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewSoldier>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RosterStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if store
    .get_soldier(&body.id)
    .await
    .map_err(ApiError::store)?
    .is_some()
  {
    return Err(ApiError::Conflict(format!(
      "soldier {} already exists",
      body.id
    )));
  }

  let soldier = store.add_soldier(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(soldier)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /soldiers/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<Soldier>, ApiError>
where
  S: RosterStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let id = parse_id(&id)?;
  let soldier = store
    .get_soldier(&id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("soldier {id} not found")))?;
  Ok(Json(soldier))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /soldiers/:id`
pub async fn update_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
  Json(patch): Json<SoldierPatch>,
) -> Result<Json<Soldier>, ApiError>
where
  S: RosterStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let id = parse_id(&id)?;
  let soldier = store
    .update_soldier(&id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("soldier {id} not found")))?;
  Ok(Json(soldier))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /soldiers/:id`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: RosterStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let id = parse_id(&id)?;
  if store.delete_soldier(&id).await.map_err(ApiError::store)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("soldier {id} not found")))
  }
}
