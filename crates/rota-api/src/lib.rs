//! JSON REST API for Rota.
//!
//! Exposes an axum [`Router`] backed by any [`rota_core::store::RosterStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", rota_api::api_router(store.clone()))
//! ```

pub mod duties;
pub mod error;
pub mod justice;
pub mod soldiers;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, put},
};
use rota_core::store::RosterStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RosterStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Soldiers
    .route(
      "/soldiers",
      get(soldiers::list::<S>).post(soldiers::create::<S>),
    )
    .route(
      "/soldiers/{id}",
      get(soldiers::get_one::<S>)
        .put(soldiers::update_one::<S>)
        .delete(soldiers::delete_one::<S>),
    )
    // Duties
    .route("/duties", get(duties::list::<S>).post(duties::create::<S>))
    .route(
      "/duties/{id}",
      get(duties::get_one::<S>)
        .put(duties::update_one::<S>)
        .delete(duties::delete_one::<S>),
    )
    .route("/duties/{id}/cancel", put(duties::cancel_one::<S>))
    // Justice board
    .route("/justice-board", get(justice::board::<S>))
    .with_state(store)
}
