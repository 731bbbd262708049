//! Per-duty scheduling decision — the pure half of the periodic driver.
//!
//! Composes the eligibility filter, the scheduled-only score aggregation,
//! and the fairness selector into one decision. The driver in the server
//! crate calls [`plan_duty`] and commits whatever it returns; nothing here
//! performs I/O.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  duty::{Duty, DutyStatus},
  eligibility::filter_eligible,
  justice::{ScorePolicy, compute_scores},
  selection::select,
  soldier::{Soldier, SoldierId},
};

/// A scheduling decision ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
  pub duty_id:     Uuid,
  pub soldier_ids: Vec<SoldierId>,
  pub decided_at:  DateTime<Utc>,
}

/// Whether the driver should consider scheduling this duty at all: not
/// already `scheduled` or `canceled`, and its start time still in the
/// future. Stale duties (start already passed) are skipped, never advanced
/// or canceled automatically.
pub fn is_candidate(duty: &Duty, now: DateTime<Utc>) -> bool {
  !matches!(duty.status, DutyStatus::Scheduled | DutyStatus::Canceled)
    && duty.start_time > now
}

/// Decide an assignment for one duty, or `None` when the duty is not a
/// candidate or selection yielded fewer than `min_candidates` soldiers.
pub fn plan_duty(
  duty: &Duty,
  soldiers: &[Soldier],
  all_duties: &[Duty],
  now: DateTime<Utc>,
  min_candidates: usize,
) -> Option<Assignment> {
  if !is_candidate(duty, now) {
    return None;
  }

  let eligible = filter_eligible(duty, soldiers, all_duties);
  let board = compute_scores(soldiers, all_duties, ScorePolicy::ScheduledOnly);
  let selected = select(duty, &eligible, &board);

  if selected.len() < min_candidates.max(1) {
    return None;
  }

  Some(Assignment {
    duty_id:     duty.duty_id,
    soldier_ids: selected,
    decided_at:  now,
  })
}
