//! Error type for `rota-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] rota_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown duty status: {0:?}")]
  UnknownStatus(String),

  #[error("column value out of range: {0}")]
  OutOfRange(&'static str),

  #[error("soldier already exists: {0}")]
  SoldierExists(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
