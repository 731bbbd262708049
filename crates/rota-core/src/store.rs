//! The `RosterStore` trait.
//!
//! Implemented by storage backends (e.g. `rota-store-sqlite`). Higher layers
//! (`rota-api`, the scheduler in `rota-server`) depend on this abstraction,
//! not on any concrete backend. The engine never opens or owns a
//! connection.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  duty::{Duty, DutyPatch, DutyStatus, NewDuty},
  soldier::{NewSoldier, Soldier, SoldierId, SoldierPatch},
};

/// Abstraction over a roster backend.
///
/// `list_*` reads must skip malformed records (with a logged warning) rather
/// than fail the whole listing: a single bad row must not abort a scheduling
/// pass.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RosterStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Soldiers ──────────────────────────────────────────────────────────

  /// Persist a new soldier. Fails if the personal number is already taken.
  fn add_soldier(
    &self,
    input: NewSoldier,
  ) -> impl Future<Output = Result<Soldier, Self::Error>> + Send + '_;

  /// Retrieve a soldier by personal number. `None` if not found.
  fn get_soldier<'a>(
    &'a self,
    id: &'a SoldierId,
  ) -> impl Future<Output = Result<Option<Soldier>, Self::Error>> + Send + 'a;

  /// List the whole roster in insertion order.
  fn list_soldiers(
    &self,
  ) -> impl Future<Output = Result<Vec<Soldier>, Self::Error>> + Send + '_;

  /// Apply a partial update. `None` if the soldier does not exist.
  fn update_soldier<'a>(
    &'a self,
    id: &'a SoldierId,
    patch: SoldierPatch,
  ) -> impl Future<Output = Result<Option<Soldier>, Self::Error>> + Send + 'a;

  /// Remove a soldier. Returns whether anything was deleted. Duties keep
  /// referencing the id; stale references are skipped at evaluation time.
  fn delete_soldier<'a>(
    &'a self,
    id: &'a SoldierId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Duties ────────────────────────────────────────────────────────────

  /// Validate and persist a new duty (status `unscheduled`, seed history
  /// entry).
  fn add_duty(
    &self,
    input: NewDuty,
  ) -> impl Future<Output = Result<Duty, Self::Error>> + Send + '_;

  /// Retrieve a duty with its full status history. `None` if not found.
  fn get_duty(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Duty>, Self::Error>> + Send + '_;

  /// List all duties with their status histories.
  fn list_duties(
    &self,
  ) -> impl Future<Output = Result<Vec<Duty>, Self::Error>> + Send + '_;

  /// Apply a partial update. Bypasses eligibility checks entirely; a status
  /// edit appends one history entry. `None` if the duty does not exist.
  fn update_duty(
    &self,
    id: Uuid,
    patch: DutyPatch,
  ) -> impl Future<Output = Result<Option<Duty>, Self::Error>> + Send + '_;

  /// Remove a duty and its history. Returns whether anything was deleted.
  /// Rejected with an error while the duty is `scheduled`; cancel first.
  fn delete_duty(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Cancel a duty (any non-terminal status → `canceled`, one history
  /// entry). `None` if not found; an error if already canceled.
  fn cancel_duty(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Duty>, Self::Error>> + Send + '_;

  // ── Scheduling ────────────────────────────────────────────────────────

  /// Commit one scheduling decision: replace the assignment list, set the
  /// status, and append exactly one history entry, atomically
  /// (read-modify-write, no partial transition). Returns `false` if the
  /// duty vanished in the meantime; an `Err` leaves the duty untouched.
  fn commit_duty_assignment(
    &self,
    duty_id: Uuid,
    soldier_ids: Vec<SoldierId>,
    new_status: DutyStatus,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
