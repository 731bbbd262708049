//! Eligibility filter — which soldiers may be assigned to a duty.
//!
//! Three independent predicates, evaluated per soldier with short-circuit:
//! constraint disjointness, rank window, and temporal non-conflict against
//! the soldier's other *scheduled* duties.

use chrono::{DateTime, Utc};

use crate::{
  duty::{Duty, DutyStatus},
  soldier::Soldier,
};

/// Filter `soldiers` down to those eligible for `duty`, preserving
/// enumeration order. `all_duties` is consulted for schedule conflicts and
/// may (and normally does) contain `duty` itself.
pub fn filter_eligible<'a>(
  duty: &Duty,
  soldiers: &'a [Soldier],
  all_duties: &[Duty],
) -> Vec<&'a Soldier> {
  soldiers
    .iter()
    .filter(|soldier| {
      !has_conflicting_limitation(soldier, duty)
        && within_rank_window(soldier, duty)
        && !has_schedule_conflict(soldier, duty, all_duties)
    })
    .collect()
}

/// True if the soldier's limitation set intersects the duty's constraint
/// set. Both sides are lowercased at ingestion, so comparison is exact.
fn has_conflicting_limitation(soldier: &Soldier, duty: &Duty) -> bool {
  soldier
    .limitations
    .iter()
    .any(|limitation| duty.constraints.contains(limitation))
}

/// True if the soldier's rank value lies inside the duty's inclusive rank
/// bounds. An absent bound imposes no constraint.
fn within_rank_window(soldier: &Soldier, duty: &Duty) -> bool {
  let value = soldier.rank.value();
  duty.min_rank.is_none_or(|min| value >= min)
    && duty.max_rank.is_none_or(|max| value <= max)
}

/// True if two half-open-style intervals overlap. Boundary-touching
/// intervals (one ends exactly when the other starts) do not conflict.
fn overlaps(
  a_start: DateTime<Utc>,
  a_end: DateTime<Utc>,
  b_start: DateTime<Utc>,
  b_end: DateTime<Utc>,
) -> bool {
  a_start < b_end && b_start < a_end
}

/// True if the soldier is assigned to some *other* duty in `scheduled`
/// status whose interval overlaps the candidate duty's interval.
fn has_schedule_conflict(
  soldier: &Soldier,
  duty: &Duty,
  all_duties: &[Duty],
) -> bool {
  all_duties.iter().any(|other| {
    other.duty_id != duty.duty_id
      && other.status == DutyStatus::Scheduled
      && other.soldiers.contains(&soldier.id)
      && overlaps(duty.start_time, duty.end_time, other.start_time, other.end_time)
  })
}
