//! Fairness selector — pick the most "deserving" eligible soldiers.
//!
//! Soldiers with the lowest accumulated score are prioritised, spreading
//! duty value evenly over time. Ties break on ascending soldier id so the
//! outcome is deterministic.

use std::collections::HashSet;

use crate::{
  duty::Duty,
  justice::JusticeBoardElement,
  soldier::{Soldier, SoldierId},
};

/// Select up to `duty.soldiers_required` soldiers from `eligible`, lowest
/// score first. Fewer eligible soldiers than required means all of them are
/// selected and the duty stays understaffed.
pub fn select(
  duty: &Duty,
  eligible: &[&Soldier],
  board: &[JusticeBoardElement],
) -> Vec<SoldierId> {
  let eligible_ids: HashSet<&SoldierId> =
    eligible.iter().map(|s| &s.id).collect();

  let mut ranked: Vec<&JusticeBoardElement> = board
    .iter()
    .filter(|e| eligible_ids.contains(&e.soldier_id))
    .collect();
  ranked.sort_by(|a, b| {
    a.score.cmp(&b.score).then_with(|| a.soldier_id.cmp(&b.soldier_id))
  });

  ranked
    .into_iter()
    .take(duty.soldiers_required as usize)
    .map(|e| e.soldier_id.clone())
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, Utc};

  use super::*;
  use crate::{
    duty::{GeoPoint, NewDuty},
    soldier::{NewSoldier, Rank},
  };

  fn soldier(id: &str) -> Soldier {
    NewSoldier {
      id:          SoldierId::new(id).unwrap(),
      name:        format!("soldier {id}"),
      rank:        Rank::Private,
      limitations: vec![],
    }
    .build(Utc::now())
  }

  fn duty_requiring(required: u32) -> Duty {
    let now = Utc::now();
    NewDuty {
      name:              "d".into(),
      description:       String::new(),
      location:          GeoPoint { latitude: 0.0, longitude: 0.0 },
      start_time:        now + Duration::hours(1),
      end_time:          now + Duration::hours(2),
      min_rank:          None,
      max_rank:          None,
      constraints:       vec![],
      soldiers_required: required,
      value:             1,
    }
    .build(now)
    .unwrap()
  }

  fn row(id: &str, score: i64) -> JusticeBoardElement {
    JusticeBoardElement { soldier_id: SoldierId::new(id).unwrap(), score }
  }

  #[test]
  fn lowest_scores_selected_in_ascending_order() {
    // Scores [10, 0, 5], two required: the 0 and the 5, in that order.
    let soldiers =
      [soldier("1000001"), soldier("1000002"), soldier("1000003")];
    let eligible: Vec<&Soldier> = soldiers.iter().collect();
    let board =
      [row("1000001", 10), row("1000002", 0), row("1000003", 5)];

    let picked = select(&duty_requiring(2), &eligible, &board);
    let ids: Vec<_> = picked.iter().map(|id| id.as_str().to_owned()).collect();
    assert_eq!(ids, ["1000002", "1000003"]);
  }

  #[test]
  fn never_more_than_required() {
    let soldiers =
      [soldier("1000001"), soldier("1000002"), soldier("1000003")];
    let eligible: Vec<&Soldier> = soldiers.iter().collect();
    let board =
      [row("1000001", 1), row("1000002", 2), row("1000003", 3)];

    assert_eq!(select(&duty_requiring(1), &eligible, &board).len(), 1);
  }

  #[test]
  fn never_selects_outside_the_eligible_set() {
    let soldiers = [soldier("1000001")];
    let eligible: Vec<&Soldier> = soldiers.iter().collect();
    // The board knows more soldiers than are eligible.
    let board = [row("1000001", 9), row("1000002", 0)];

    let picked = select(&duty_requiring(2), &eligible, &board);
    assert_eq!(picked, [SoldierId::new("1000001").unwrap()]);
  }

  #[test]
  fn understaffed_when_too_few_eligible() {
    let soldiers = [soldier("1000001"), soldier("1000002")];
    let eligible: Vec<&Soldier> = soldiers.iter().collect();
    let board = [row("1000001", 0), row("1000002", 0)];

    assert_eq!(select(&duty_requiring(5), &eligible, &board).len(), 2);
  }

  #[test]
  fn ties_break_on_ascending_soldier_id() {
    let soldiers =
      [soldier("3000000"), soldier("1000000"), soldier("2000000")];
    let eligible: Vec<&Soldier> = soldiers.iter().collect();
    let board =
      [row("3000000", 4), row("1000000", 4), row("2000000", 4)];

    let picked = select(&duty_requiring(2), &eligible, &board);
    let ids: Vec<_> = picked.iter().map(|id| id.as_str().to_owned()).collect();
    assert_eq!(ids, ["1000000", "2000000"]);
  }
}
