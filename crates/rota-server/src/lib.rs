//! Server wiring for Rota: runtime configuration and the periodic duty
//! scheduler. The binary in `main.rs` glues these to the HTTP API and the
//! SQLite store.

pub mod scheduler;

use std::path::PathBuf;

use serde::Deserialize;

/// Runtime server configuration, deserialised from `config.toml` layered
/// under `ROTA_`-prefixed environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  /// Seconds between scheduling passes.
  #[serde(default = "default_tick_secs")]
  pub tick_interval_secs: u64,
  /// How many selected soldiers are enough to flip a duty to `scheduled`.
  #[serde(default = "default_min_candidates")]
  pub min_candidates:     usize,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("rota.db") }
fn default_tick_secs() -> u64 { 300 }
fn default_min_candidates() -> usize { 1 }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:               default_host(),
      port:               default_port(),
      store_path:         default_store_path(),
      tick_interval_secs: default_tick_secs(),
      min_candidates:     default_min_candidates(),
    }
  }
}
