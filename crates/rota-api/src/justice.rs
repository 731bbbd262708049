//! Handler for the `/justice-board` endpoint.

use std::sync::Arc;

use axum::{Json, extract::State};
use rota_core::{
  justice::{JusticeBoardElement, ScorePolicy, compute_scores},
  store::RosterStore,
};

use crate::error::ApiError;

/// `GET /justice-board` — the full leaderboard, recomputed on every query.
///
/// Counts every duty regardless of status (`ScorePolicy::AllStatuses`) and
/// returns rows ascending by score, soldier id breaking ties — the same
/// order the fairness selector consumes.
pub async fn board<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<JusticeBoardElement>>, ApiError>
where
  S: RosterStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let soldiers = store.list_soldiers().await.map_err(ApiError::store)?;
  let duties = store.list_duties().await.map_err(ApiError::store)?;

  let mut board =
    compute_scores(&soldiers, &duties, ScorePolicy::AllStatuses);
  board.sort_by(|a, b| {
    a.score.cmp(&b.score).then_with(|| a.soldier_id.cmp(&b.soldier_id))
  });
  Ok(Json(board))
}
