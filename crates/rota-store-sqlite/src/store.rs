//! [`SqliteStore`] — the SQLite implementation of [`RosterStore`].

use std::{collections::HashMap, path::Path};

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use rota_core::{
  duty::{Duty, DutyPatch, DutyStatus, NewDuty},
  soldier::{NewSoldier, Soldier, SoldierId, SoldierPatch},
  store::RosterStore,
};

use crate::{
  Error, Result,
  encode::{
    RawDuty, RawSoldier, RawStatusChange, encode_dt, encode_soldier_ids,
    encode_status, encode_tags, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A roster store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Run raw SQL against the underlying connection. Tests use this to plant
  /// rows the encoders would refuse to write.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &str) -> Result<()> {
    let sql = sql.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Write the full mutable column set of a duty row, appending a history
  /// entry when the status changed. One transaction, no partial write.
  async fn write_duty_row(
    &self,
    duty: &Duty,
    append_history: bool,
  ) -> Result<()> {
    let duty_id_str    = encode_uuid(duty.duty_id);
    let name           = duty.name.clone();
    let description    = duty.description.clone();
    let latitude       = duty.location.latitude;
    let longitude      = duty.location.longitude;
    let start_str      = encode_dt(duty.start_time);
    let end_str        = encode_dt(duty.end_time);
    let min_rank       = duty.min_rank.map(i64::from);
    let max_rank       = duty.max_rank.map(i64::from);
    let constraints    = encode_tags(&duty.constraints)?;
    let required       = duty.soldiers_required as i64;
    let value          = duty.value;
    let soldiers       = encode_soldier_ids(&duty.soldiers)?;
    let status_str     = encode_status(duty.status);
    let updated_at_str = encode_dt(duty.updated_at);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "UPDATE duties SET
             name = ?2, description = ?3, latitude = ?4, longitude = ?5,
             start_time = ?6, end_time = ?7, min_rank = ?8, max_rank = ?9,
             constraints = ?10, soldiers_required = ?11, value = ?12,
             soldiers = ?13, status = ?14, updated_at = ?15
           WHERE duty_id = ?1",
          rusqlite::params![
            duty_id_str,
            name,
            description,
            latitude,
            longitude,
            start_str,
            end_str,
            min_rank,
            max_rank,
            constraints,
            required,
            value,
            soldiers,
            status_str,
            updated_at_str,
          ],
        )?;
        if append_history {
          tx.execute(
            "INSERT INTO status_history (duty_id, status, at) VALUES (?1, ?2, ?3)",
            rusqlite::params![duty_id_str, status_str, updated_at_str],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Cancel outcome crossing the closure boundary before it is mapped to the
/// store's error type.
enum CancelRow {
  NotFound,
  AlreadyCanceled,
  Canceled,
}

/// Delete outcome crossing the closure boundary before it is mapped to the
/// store's error type.
enum DeleteRow {
  NotFound,
  Scheduled,
  Deleted,
}

// ─── RosterStore impl ────────────────────────────────────────────────────────

impl RosterStore for SqliteStore {
  type Error = Error;

  // ── Soldiers ──────────────────────────────────────────────────────────────

  async fn add_soldier(&self, input: NewSoldier) -> Result<Soldier> {
    let soldier = input.build(Utc::now());

    let id_str          = soldier.id.as_str().to_owned();
    let name            = soldier.name.clone();
    let rank            = i64::from(soldier.rank.value());
    let limitations_str = encode_tags(&soldier.limitations)?;
    let at_str          = encode_dt(soldier.created_at);

    let already_exists: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM soldiers WHERE soldier_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if exists {
          return Ok(true);
        }
        tx.execute(
          "INSERT INTO soldiers (soldier_id, name, rank, limitations, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![id_str, name, rank, limitations_str, at_str],
        )?;
        tx.commit()?;
        Ok(false)
      })
      .await?;

    if already_exists {
      return Err(Error::SoldierExists(soldier.id.as_str().to_owned()));
    }
    Ok(soldier)
  }

  async fn get_soldier(&self, id: &SoldierId) -> Result<Option<Soldier>> {
    let id_str = id.as_str().to_owned();

    let raw: Option<RawSoldier> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT soldier_id, name, rank, limitations, created_at, updated_at
             FROM soldiers WHERE soldier_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawSoldier {
                soldier_id:  row.get(0)?,
                name:        row.get(1)?,
                rank:        row.get(2)?,
                limitations: row.get(3)?,
                created_at:  row.get(4)?,
                updated_at:  row.get(5)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSoldier::into_soldier).transpose()
  }

  async fn list_soldiers(&self) -> Result<Vec<Soldier>> {
    let raws: Vec<RawSoldier> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT soldier_id, name, rank, limitations, created_at, updated_at
           FROM soldiers ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSoldier {
              soldier_id:  row.get(0)?,
              name:        row.get(1)?,
              rank:        row.get(2)?,
              limitations: row.get(3)?,
              created_at:  row.get(4)?,
              updated_at:  row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    // A malformed row is excluded from the candidate pool, not a fatal
    // error; the listing must complete for all other records.
    let mut soldiers = Vec::with_capacity(raws.len());
    for raw in raws {
      match raw.into_soldier() {
        Ok(soldier) => soldiers.push(soldier),
        Err(error) => {
          tracing::warn!(%error, "skipping malformed soldier row");
        }
      }
    }
    Ok(soldiers)
  }

  async fn update_soldier(
    &self,
    id: &SoldierId,
    patch: SoldierPatch,
  ) -> Result<Option<Soldier>> {
    let Some(mut soldier) = self.get_soldier(id).await? else {
      return Ok(None);
    };
    patch.apply(&mut soldier, Utc::now());

    let id_str          = soldier.id.as_str().to_owned();
    let name            = soldier.name.clone();
    let rank            = i64::from(soldier.rank.value());
    let limitations_str = encode_tags(&soldier.limitations)?;
    let updated_at_str  = encode_dt(soldier.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE soldiers SET name = ?2, rank = ?3, limitations = ?4, updated_at = ?5
           WHERE soldier_id = ?1",
          rusqlite::params![id_str, name, rank, limitations_str, updated_at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(Some(soldier))
  }

  async fn delete_soldier(&self, id: &SoldierId) -> Result<bool> {
    let id_str = id.as_str().to_owned();
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM soldiers WHERE soldier_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }

  // ── Duties ────────────────────────────────────────────────────────────────

  async fn add_duty(&self, input: NewDuty) -> Result<Duty> {
    let duty = input.build(Utc::now())?;

    let duty_id_str     = encode_uuid(duty.duty_id);
    let name            = duty.name.clone();
    let description     = duty.description.clone();
    let latitude        = duty.location.latitude;
    let longitude       = duty.location.longitude;
    let start_str       = encode_dt(duty.start_time);
    let end_str         = encode_dt(duty.end_time);
    let min_rank        = duty.min_rank.map(i64::from);
    let max_rank        = duty.max_rank.map(i64::from);
    let constraints_str = encode_tags(&duty.constraints)?;
    let required        = duty.soldiers_required as i64;
    let value           = duty.value;
    let soldiers_str    = encode_soldier_ids(&duty.soldiers)?;
    let status_str      = encode_status(duty.status);
    let at_str          = encode_dt(duty.created_at);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO duties (
             duty_id, name, description, latitude, longitude,
             start_time, end_time, min_rank, max_rank, constraints,
             soldiers_required, value, soldiers, status, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)",
          rusqlite::params![
            duty_id_str,
            name,
            description,
            latitude,
            longitude,
            start_str,
            end_str,
            min_rank,
            max_rank,
            constraints_str,
            required,
            value,
            soldiers_str,
            status_str,
            at_str,
          ],
        )?;
        // Seed history entry: the initial `unscheduled` transition.
        tx.execute(
          "INSERT INTO status_history (duty_id, status, at) VALUES (?1, ?2, ?3)",
          rusqlite::params![duty_id_str, status_str, at_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(duty)
  }

  async fn get_duty(&self, id: Uuid) -> Result<Option<Duty>> {
    let id_str = encode_uuid(id);

    let found: Option<(RawDuty, Vec<RawStatusChange>)> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT duty_id, name, description, latitude, longitude,
                    start_time, end_time, min_rank, max_rank, constraints,
                    soldiers_required, value, soldiers, status, created_at, updated_at
             FROM duties WHERE duty_id = ?1",
            rusqlite::params![id_str],
            map_raw_duty,
          )
          .optional()?;

        let Some(raw) = raw else { return Ok(None) };

        let mut stmt = conn.prepare(
          "SELECT duty_id, status, at FROM status_history
           WHERE duty_id = ?1 ORDER BY rowid",
        )?;
        let history = stmt
          .query_map(rusqlite::params![id_str], map_raw_history)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some((raw, history)))
      })
      .await?;

    let Some((raw, raw_history)) = found else { return Ok(None) };
    let history = raw_history
      .into_iter()
      .map(RawStatusChange::into_change)
      .collect::<Result<Vec<_>>>()?;
    raw.into_duty(history).map(Some)
  }

  async fn list_duties(&self) -> Result<Vec<Duty>> {
    let (raws, raw_history): (Vec<RawDuty>, Vec<RawStatusChange>) = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT duty_id, name, description, latitude, longitude,
                  start_time, end_time, min_rank, max_rank, constraints,
                  soldiers_required, value, soldiers, status, created_at, updated_at
           FROM duties ORDER BY rowid",
        )?;
        let duties = stmt
          .query_map([], map_raw_duty)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn
          .prepare("SELECT duty_id, status, at FROM status_history ORDER BY rowid")?;
        let history = stmt
          .query_map([], map_raw_history)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((duties, history))
      })
      .await?;

    let mut history_by_duty: HashMap<String, Vec<RawStatusChange>> =
      HashMap::new();
    for entry in raw_history {
      history_by_duty.entry(entry.duty_id.clone()).or_default().push(entry);
    }

    // Same policy as `list_soldiers`: warn and skip malformed records.
    let mut duties = Vec::with_capacity(raws.len());
    for raw in raws {
      let decoded = history_by_duty
        .remove(&raw.duty_id)
        .unwrap_or_default()
        .into_iter()
        .map(RawStatusChange::into_change)
        .collect::<Result<Vec<_>>>()
        .and_then(|history| raw.into_duty(history));
      match decoded {
        Ok(duty) => duties.push(duty),
        Err(error) => {
          tracing::warn!(%error, "skipping malformed duty row");
        }
      }
    }
    Ok(duties)
  }

  async fn update_duty(
    &self,
    id: Uuid,
    patch: DutyPatch,
  ) -> Result<Option<Duty>> {
    let Some(mut duty) = self.get_duty(id).await? else {
      return Ok(None);
    };
    let old_status = duty.status;
    patch.apply(&mut duty, Utc::now())?;

    self.write_duty_row(&duty, duty.status != old_status).await?;
    Ok(Some(duty))
  }

  async fn delete_duty(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let scheduled_str = encode_status(DutyStatus::Scheduled);

    // Re-check the status inside the transaction: a duty scheduled after
    // the caller's own read must not be silently destroyed.
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let status: Option<String> = tx
          .query_row(
            "SELECT status FROM duties WHERE duty_id = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?;

        let Some(status) = status else { return Ok(DeleteRow::NotFound) };
        if status == scheduled_str {
          return Ok(DeleteRow::Scheduled);
        }

        tx.execute(
          "DELETE FROM duties WHERE duty_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(DeleteRow::Deleted)
      })
      .await?;

    match outcome {
      DeleteRow::NotFound => Ok(false),
      DeleteRow::Scheduled => {
        Err(Error::Core(rota_core::Error::DeleteWhileScheduled(id)))
      }
      DeleteRow::Deleted => Ok(true),
    }
  }

  async fn cancel_duty(&self, id: Uuid) -> Result<Option<Duty>> {
    let id_str = encode_uuid(id);
    let canceled_str = encode_status(DutyStatus::Canceled);
    let at_str = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let status: Option<String> = tx
          .query_row(
            "SELECT status FROM duties WHERE duty_id = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?;

        let Some(status) = status else { return Ok(CancelRow::NotFound) };
        if status == canceled_str {
          return Ok(CancelRow::AlreadyCanceled);
        }

        tx.execute(
          "UPDATE duties SET status = ?2, updated_at = ?3 WHERE duty_id = ?1",
          rusqlite::params![id_str, canceled_str, at_str],
        )?;
        tx.execute(
          "INSERT INTO status_history (duty_id, status, at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, canceled_str, at_str],
        )?;
        tx.commit()?;
        Ok(CancelRow::Canceled)
      })
      .await?;

    match outcome {
      CancelRow::NotFound => Ok(None),
      CancelRow::AlreadyCanceled => {
        Err(Error::Core(rota_core::Error::AlreadyCanceled(id)))
      }
      CancelRow::Canceled => self.get_duty(id).await,
    }
  }

  // ── Scheduling ────────────────────────────────────────────────────────────

  async fn commit_duty_assignment(
    &self,
    duty_id: Uuid,
    soldier_ids: Vec<SoldierId>,
    new_status: DutyStatus,
    at: DateTime<Utc>,
  ) -> Result<bool> {
    let id_str       = encode_uuid(duty_id);
    let soldiers_str = encode_soldier_ids(&soldier_ids)?;
    let status_str   = encode_status(new_status);
    let at_str       = encode_dt(at);

    let committed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM duties WHERE duty_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(false);
        }

        tx.execute(
          "UPDATE duties SET soldiers = ?2, status = ?3, updated_at = ?4
           WHERE duty_id = ?1",
          rusqlite::params![id_str, soldiers_str, status_str, at_str],
        )?;
        tx.execute(
          "INSERT INTO status_history (duty_id, status, at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, status_str, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(committed)
  }
}

// ─── Row mappers ─────────────────────────────────────────────────────────────

fn map_raw_duty(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawDuty> {
  Ok(RawDuty {
    duty_id:           row.get(0)?,
    name:              row.get(1)?,
    description:       row.get(2)?,
    latitude:          row.get(3)?,
    longitude:         row.get(4)?,
    start_time:        row.get(5)?,
    end_time:          row.get(6)?,
    min_rank:          row.get(7)?,
    max_rank:          row.get(8)?,
    constraints:       row.get(9)?,
    soldiers_required: row.get(10)?,
    value:             row.get(11)?,
    soldiers:          row.get(12)?,
    status:            row.get(13)?,
    created_at:        row.get(14)?,
    updated_at:        row.get(15)?,
  })
}

fn map_raw_history(
  row: &rusqlite::Row<'_>,
) -> rusqlite::Result<RawStatusChange> {
  Ok(RawStatusChange {
    duty_id: row.get(0)?,
    status:  row.get(1)?,
    at:      row.get(2)?,
  })
}
