//! Duty — a schedulable task with time bounds, eligibility rules, and a
//! point value.
//!
//! A duty owns its assignment list and its status history. The history is
//! append-only: one [`StatusChange`] per transition, seeded with the initial
//! `unscheduled` entry at creation, never rewritten or pruned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  soldier::{SoldierId, normalize_tags},
};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle status of a duty. `canceled` is terminal; `scheduled` is
/// terminal as far as the automatic scheduler is concerned.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Display,
  EnumString,
  Serialize,
  Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DutyStatus {
  Unscheduled,
  Scheduled,
  Canceled,
}

impl DutyStatus {
  pub fn is_terminal(self) -> bool { matches!(self, Self::Canceled) }
}

/// One entry in a duty's append-only status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
  pub status: DutyStatus,
  pub at:     DateTime<Utc>,
}

// ─── Location ────────────────────────────────────────────────────────────────

/// Geographic point of the duty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
  pub latitude:  f64,
  pub longitude: f64,
}

// ─── Duty ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Duty {
  pub duty_id:           Uuid,
  pub name:              String,
  pub description:       String,
  pub location:          GeoPoint,
  pub start_time:        DateTime<Utc>,
  pub end_time:          DateTime<Utc>,
  /// Inclusive rank bounds; an absent bound imposes no constraint.
  pub min_rank:          Option<u8>,
  pub max_rank:          Option<u8>,
  /// Tags that disqualify soldiers sharing the same limitation tag.
  /// Lowercased at ingestion.
  pub constraints:       Vec<String>,
  pub soldiers_required: u32,
  /// Points awarded to each assigned soldier.
  pub value:             i64,
  /// Ordered assignment list; soldiers are referenced by id only.
  pub soldiers:          Vec<SoldierId>,
  pub status:            DutyStatus,
  pub status_history:    Vec<StatusChange>,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}

impl Duty {
  /// Record a status transition, appending one history entry.
  pub fn transition(&mut self, status: DutyStatus, at: DateTime<Utc>) {
    self.status = status;
    self.status_history.push(StatusChange { status, at });
    self.updated_at = at;
  }
}

// ─── NewDuty ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::RosterStore::add_duty`]. Identity, status, and
/// timestamps are assigned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDuty {
  pub name:              String,
  #[serde(default)]
  pub description:       String,
  pub location:          GeoPoint,
  pub start_time:        DateTime<Utc>,
  pub end_time:          DateTime<Utc>,
  pub min_rank:          Option<u8>,
  pub max_rank:          Option<u8>,
  #[serde(default)]
  pub constraints:       Vec<String>,
  pub soldiers_required: u32,
  pub value:             i64,
}

impl NewDuty {
  /// Validate and build the persisted form. The new duty starts out
  /// `unscheduled` with one seed history entry.
  pub fn build(self, now: DateTime<Utc>) -> Result<Duty> {
    if self.start_time >= self.end_time {
      return Err(Error::InvalidTimeRange);
    }
    if self.start_time < now {
      return Err(Error::StartInPast);
    }
    validate_rank_window(self.min_rank, self.max_rank)?;
    if self.soldiers_required == 0 {
      return Err(Error::ZeroSoldiersRequired);
    }
    if self.value < 0 {
      return Err(Error::NegativeValue);
    }

    Ok(Duty {
      duty_id:           Uuid::new_v4(),
      name:              self.name,
      description:       self.description,
      location:          self.location,
      start_time:        self.start_time,
      end_time:          self.end_time,
      min_rank:          self.min_rank,
      max_rank:          self.max_rank,
      constraints:       normalize_tags(self.constraints),
      soldiers_required: self.soldiers_required,
      value:             self.value,
      soldiers:          Vec::new(),
      status:            DutyStatus::Unscheduled,
      status_history:    vec![StatusChange {
        status: DutyStatus::Unscheduled,
        at:     now,
      }],
      created_at:        now,
      updated_at:        now,
    })
  }
}

fn validate_rank_window(min: Option<u8>, max: Option<u8>) -> Result<()> {
  for bound in [min, max].into_iter().flatten() {
    if bound > 6 {
      return Err(Error::UnknownRankValue(bound));
    }
  }
  if let (Some(min), Some(max)) = (min, max)
    && min > max
  {
    return Err(Error::InvalidRankWindow { min, max });
  }
  Ok(())
}

// ─── DutyPatch ───────────────────────────────────────────────────────────────

/// Partial update for a duty; absent fields are left untouched.
///
/// A direct update bypasses eligibility checks entirely, including edits to
/// the assignment list and status. A status edit still appends one history
/// entry, keeping the history one-entry-per-transition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DutyPatch {
  pub name:              Option<String>,
  pub description:       Option<String>,
  pub location:          Option<GeoPoint>,
  pub start_time:        Option<DateTime<Utc>>,
  pub end_time:          Option<DateTime<Utc>>,
  /// `Some(None)` clears the bound.
  #[serde(default, with = "double_option")]
  pub min_rank:          Option<Option<u8>>,
  #[serde(default, with = "double_option")]
  pub max_rank:          Option<Option<u8>>,
  pub constraints:       Option<Vec<String>>,
  pub soldiers_required: Option<u32>,
  pub value:             Option<i64>,
  pub soldiers:          Option<Vec<SoldierId>>,
  pub status:            Option<DutyStatus>,
}

impl DutyPatch {
  /// Apply the patch, re-validating time ordering and the rank window.
  pub fn apply(self, duty: &mut Duty, now: DateTime<Utc>) -> Result<()> {
    if let Some(name) = self.name {
      duty.name = name;
    }
    if let Some(description) = self.description {
      duty.description = description;
    }
    if let Some(location) = self.location {
      duty.location = location;
    }
    if let Some(start) = self.start_time {
      duty.start_time = start;
    }
    if let Some(end) = self.end_time {
      duty.end_time = end;
    }
    if let Some(min) = self.min_rank {
      duty.min_rank = min;
    }
    if let Some(max) = self.max_rank {
      duty.max_rank = max;
    }
    if let Some(constraints) = self.constraints {
      duty.constraints = normalize_tags(constraints);
    }
    if let Some(required) = self.soldiers_required {
      if required == 0 {
        return Err(Error::ZeroSoldiersRequired);
      }
      duty.soldiers_required = required;
    }
    if let Some(value) = self.value {
      if value < 0 {
        return Err(Error::NegativeValue);
      }
      duty.value = value;
    }
    if let Some(soldiers) = self.soldiers {
      duty.soldiers = soldiers;
    }

    if duty.start_time >= duty.end_time {
      return Err(Error::InvalidTimeRange);
    }
    validate_rank_window(duty.min_rank, duty.max_rank)?;

    match self.status {
      Some(status) if status != duty.status => duty.transition(status, now),
      _ => duty.updated_at = now,
    }
    Ok(())
  }
}

/// Serde helper distinguishing an absent field from an explicit `null`.
mod double_option {
  use serde::{Deserialize, Deserializer};

  pub fn deserialize<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
  where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
  {
    Option::<T>::deserialize(d).map(Some)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
