//! Soldier — a person with a rank and a set of limitation tags.
//!
//! The rank dictionary is closed: seven ranks, values 0 through 6, with the
//! name and the numeric value always in agreement. Wire representations
//! carry both forms and are cross-checked on deserialisation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{Error, Result};

// ─── SoldierId ───────────────────────────────────────────────────────────────

/// A personal number — exactly 7 ASCII digits. The sole identity of a
/// soldier; duties reference soldiers by this id only.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct SoldierId(String);

impl SoldierId {
  pub fn new(id: impl Into<String>) -> Result<Self> {
    let id = id.into();
    if id.len() == 7 && id.bytes().all(|b| b.is_ascii_digit()) {
      Ok(Self(id))
    } else {
      Err(Error::InvalidSoldierId(id))
    }
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for SoldierId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { Self::new(s) }
}

impl From<SoldierId> for String {
  fn from(id: SoldierId) -> String { id.0 }
}

impl std::fmt::Display for SoldierId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Rank ────────────────────────────────────────────────────────────────────

/// The fixed seven-rank dictionary. Ordering follows the numeric value.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Display,
  EnumString,
  EnumIter,
  Serialize,
  Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(try_from = "RankRepr", into = "RankRepr")]
pub enum Rank {
  Private,
  Corporal,
  Sergeant,
  Lieutenant,
  Captain,
  Major,
  Colonel,
}

impl Rank {
  /// The numeric value of this rank (private = 0 … colonel = 6).
  pub fn value(self) -> u8 { self as u8 }

  /// Look a rank up by its numeric value.
  pub fn from_value(value: u8) -> Result<Self> {
    use Rank::*;
    Ok(match value {
      0 => Private,
      1 => Corporal,
      2 => Sergeant,
      3 => Lieutenant,
      4 => Captain,
      5 => Major,
      6 => Colonel,
      other => return Err(Error::UnknownRankValue(other)),
    })
  }
}

/// Wire form of a rank: both the name and the numeric value, cross-checked
/// against the dictionary on input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankRepr {
  pub name:  String,
  pub value: u8,
}

impl TryFrom<RankRepr> for Rank {
  type Error = Error;

  fn try_from(repr: RankRepr) -> Result<Self> {
    let rank: Rank = repr
      .name
      .parse()
      .map_err(|_| Error::UnknownRankName(repr.name.clone()))?;
    if rank.value() != repr.value {
      return Err(Error::RankMismatch { name: repr.name, value: repr.value });
    }
    Ok(rank)
  }
}

impl From<Rank> for RankRepr {
  fn from(rank: Rank) -> RankRepr {
    RankRepr { name: rank.to_string(), value: rank.value() }
  }
}

// ─── Soldier ─────────────────────────────────────────────────────────────────

/// A roster member. Duties reference soldiers by [`SoldierId`]; no duty list
/// is stored on the soldier itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Soldier {
  pub id:          SoldierId,
  pub name:        String,
  pub rank:        Rank,
  /// Free-form tags; lowercased at ingestion.
  pub limitations: Vec<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

// ─── NewSoldier ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::RosterStore::add_soldier`]. Timestamps are set by
/// the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSoldier {
  pub id:          SoldierId,
  pub name:        String,
  pub rank:        Rank,
  #[serde(default)]
  pub limitations: Vec<String>,
}

impl NewSoldier {
  /// Build the persisted form, lowercasing limitation tags.
  pub fn build(self, now: DateTime<Utc>) -> Soldier {
    Soldier {
      id:          self.id,
      name:        self.name,
      rank:        self.rank,
      limitations: normalize_tags(self.limitations),
      created_at:  now,
      updated_at:  now,
    }
  }
}

// ─── SoldierPatch ────────────────────────────────────────────────────────────

/// Partial update for a soldier; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SoldierPatch {
  pub name:        Option<String>,
  pub rank:        Option<Rank>,
  pub limitations: Option<Vec<String>>,
}

impl SoldierPatch {
  pub fn apply(self, soldier: &mut Soldier, now: DateTime<Utc>) {
    if let Some(name) = self.name {
      soldier.name = name;
    }
    if let Some(rank) = self.rank {
      soldier.rank = rank;
    }
    if let Some(limitations) = self.limitations {
      soldier.limitations = normalize_tags(limitations);
    }
    soldier.updated_at = now;
  }
}

/// Lowercase and trim a tag set. Applied to soldier limitations and duty
/// constraints alike so the intersection test compares exact strings.
pub(crate) fn normalize_tags(tags: Vec<String>) -> Vec<String> {
  tags
    .into_iter()
    .map(|t| t.trim().to_lowercase())
    .filter(|t| !t.is_empty())
    .collect()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn soldier_id_accepts_seven_digits() {
    assert!(SoldierId::new("1234567").is_ok());
  }

  #[test]
  fn soldier_id_rejects_bad_forms() {
    for bad in ["123456", "12345678", "123456a", "", "12 4567"] {
      assert!(SoldierId::new(bad).is_err(), "accepted {bad:?}");
    }
  }

  #[test]
  fn rank_values_roundtrip() {
    for rank in Rank::iter() {
      assert_eq!(Rank::from_value(rank.value()).unwrap(), rank);
    }
    assert!(Rank::from_value(7).is_err());
  }

  #[test]
  fn rank_repr_cross_checks_name_and_value() {
    let ok = RankRepr { name: "sergeant".into(), value: 2 };
    assert_eq!(Rank::try_from(ok).unwrap(), Rank::Sergeant);

    let mismatch = RankRepr { name: "sergeant".into(), value: 3 };
    assert!(matches!(
      Rank::try_from(mismatch),
      Err(Error::RankMismatch { .. })
    ));

    let unknown = RankRepr { name: "general".into(), value: 6 };
    assert!(matches!(
      Rank::try_from(unknown),
      Err(Error::UnknownRankName(_))
    ));
  }

  #[test]
  fn limitations_are_lowercased_on_build() {
    let soldier = NewSoldier {
      id:          SoldierId::new("1234567").unwrap(),
      name:        "A".into(),
      rank:        Rank::Private,
      limitations: vec!["  Dust ".into(), "HEAT".into(), "".into()],
    }
    .build(Utc::now());
    assert_eq!(soldier.limitations, ["dust", "heat"]);
  }
}
