//! SQL schema for the Rota SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS soldiers (
    soldier_id  TEXT PRIMARY KEY,        -- 7-digit personal number
    name        TEXT NOT NULL,
    rank        INTEGER NOT NULL,        -- 0..6 per the rank dictionary
    limitations TEXT NOT NULL DEFAULT '[]',  -- JSON array, lowercased
    created_at  TEXT NOT NULL,           -- ISO 8601 UTC
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS duties (
    duty_id           TEXT PRIMARY KEY,
    name              TEXT NOT NULL,
    description       TEXT NOT NULL DEFAULT '',
    latitude          REAL NOT NULL,
    longitude         REAL NOT NULL,
    start_time        TEXT NOT NULL,
    end_time          TEXT NOT NULL,
    min_rank          INTEGER,           -- NULL imposes no bound
    max_rank          INTEGER,
    constraints       TEXT NOT NULL DEFAULT '[]',  -- JSON array, lowercased
    soldiers_required INTEGER NOT NULL,
    value             INTEGER NOT NULL,
    soldiers          TEXT NOT NULL DEFAULT '[]',  -- ordered JSON array of ids
    status            TEXT NOT NULL,     -- 'unscheduled'|'scheduled'|'canceled'
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

-- Status history is strictly append-only.
-- No UPDATE is ever issued against this table; rows are removed only when
-- their duty is deleted (cascade).
CREATE TABLE IF NOT EXISTS status_history (
    duty_id TEXT NOT NULL REFERENCES duties(duty_id) ON DELETE CASCADE,
    status  TEXT NOT NULL,
    at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS status_history_duty_idx ON status_history(duty_id);
CREATE INDEX IF NOT EXISTS duties_status_idx       ON duties(status);
CREATE INDEX IF NOT EXISTS duties_start_idx        ON duties(start_time);

PRAGMA user_version = 1;
";
