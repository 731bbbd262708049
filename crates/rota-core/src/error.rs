//! Error types for `rota-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid soldier id {0:?}: must be exactly 7 ASCII digits")]
  InvalidSoldierId(String),

  #[error("no rank has value {0} (valid values are 0..=6)")]
  UnknownRankValue(u8),

  #[error("unknown rank name: {0:?}")]
  UnknownRankName(String),

  #[error("rank name {name:?} does not correspond to value {value}")]
  RankMismatch { name: String, value: u8 },

  #[error("duty start time must be strictly before its end time")]
  InvalidTimeRange,

  #[error("duty start time must not be in the past")]
  StartInPast,

  #[error("min rank {min} exceeds max rank {max}")]
  InvalidRankWindow { min: u8, max: u8 },

  #[error("duty must require at least one soldier")]
  ZeroSoldiersRequired,

  #[error("duty value must be non-negative")]
  NegativeValue,

  #[error("duty {0} is already canceled")]
  AlreadyCanceled(Uuid),

  #[error("duty {0} is scheduled and cannot be deleted")]
  DeleteWhileScheduled(Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
