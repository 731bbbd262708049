//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Tag and assignment lists
//! are stored as compact JSON arrays. UUIDs are stored as hyphenated
//! lowercase strings; duty status as its lowercase name.

use chrono::{DateTime, Utc};
use rota_core::{
  duty::{Duty, DutyStatus, GeoPoint, StatusChange},
  soldier::{Rank, Soldier, SoldierId},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── DutyStatus ──────────────────────────────────────────────────────────────

pub fn encode_status(status: DutyStatus) -> String { status.to_string() }

pub fn decode_status(s: &str) -> Result<DutyStatus> {
  s.parse().map_err(|_| Error::UnknownStatus(s.to_owned()))
}

// ─── JSON lists ──────────────────────────────────────────────────────────────

pub fn encode_tags(tags: &[String]) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_soldier_ids(ids: &[SoldierId]) -> Result<String> {
  Ok(serde_json::to_string(ids)?)
}

pub fn decode_soldier_ids(s: &str) -> Result<Vec<SoldierId>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A `soldiers` row as read from SQLite, before decoding.
pub struct RawSoldier {
  pub soldier_id:  String,
  pub name:        String,
  pub rank:        i64,
  pub limitations: String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawSoldier {
  pub fn into_soldier(self) -> Result<Soldier> {
    Ok(Soldier {
      id:          SoldierId::new(self.soldier_id).map_err(Error::Core)?,
      name:        self.name,
      // Out-of-range column values collapse to an UnknownRankValue error.
      rank:        Rank::from_value(u8::try_from(self.rank).unwrap_or(u8::MAX))
        .map_err(Error::Core)?,
      limitations: decode_tags(&self.limitations)?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// A `status_history` row as read from SQLite.
pub struct RawStatusChange {
  pub duty_id: String,
  pub status:  String,
  pub at:      String,
}

impl RawStatusChange {
  pub fn into_change(self) -> Result<StatusChange> {
    Ok(StatusChange {
      status: decode_status(&self.status)?,
      at:     decode_dt(&self.at)?,
    })
  }
}

/// A `duties` row as read from SQLite, before decoding; history rows are
/// joined in separately.
pub struct RawDuty {
  pub duty_id:           String,
  pub name:              String,
  pub description:       String,
  pub latitude:          f64,
  pub longitude:         f64,
  pub start_time:        String,
  pub end_time:          String,
  pub min_rank:          Option<i64>,
  pub max_rank:          Option<i64>,
  pub constraints:       String,
  pub soldiers_required: i64,
  pub value:             i64,
  pub soldiers:          String,
  pub status:            String,
  pub created_at:        String,
  pub updated_at:        String,
}

impl RawDuty {
  pub fn into_duty(self, history: Vec<StatusChange>) -> Result<Duty> {
    Ok(Duty {
      duty_id:           decode_uuid(&self.duty_id)?,
      name:              self.name,
      description:       self.description,
      location:          GeoPoint {
        latitude:  self.latitude,
        longitude: self.longitude,
      },
      start_time:        decode_dt(&self.start_time)?,
      end_time:          decode_dt(&self.end_time)?,
      min_rank:          self
        .min_rank
        .map(u8::try_from)
        .transpose()
        .map_err(|_| Error::OutOfRange("min_rank"))?,
      max_rank:          self
        .max_rank
        .map(u8::try_from)
        .transpose()
        .map_err(|_| Error::OutOfRange("max_rank"))?,
      constraints:       decode_tags(&self.constraints)?,
      soldiers_required: u32::try_from(self.soldiers_required)
        .map_err(|_| Error::OutOfRange("soldiers_required"))?,
      value:             self.value,
      soldiers:          decode_soldier_ids(&self.soldiers)?,
      status:            decode_status(&self.status)?,
      status_history:    history,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
    })
  }
}
