//! Justice board — the derived leaderboard of accumulated duty value.
//!
//! Never persisted; recomputed from the soldier and duty collections on
//! every query. The aggregation is soldier-driven: every soldier appears in
//! the output, with score 0 when assigned to nothing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
  duty::{Duty, DutyStatus},
  soldier::{Soldier, SoldierId},
};

/// Which duties count toward a soldier's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorePolicy {
  /// Every duty the soldier is assigned to, regardless of status. Used by
  /// the plain leaderboard view.
  AllStatuses,
  /// Only duties in `scheduled` status. Required when feeding the fairness
  /// selector — counting not-yet-scheduled duties would double-bias
  /// selection.
  ScheduledOnly,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JusticeBoardElement {
  pub soldier_id: SoldierId,
  pub score:      i64,
}

/// Sum each soldier's accumulated duty value.
///
/// Output rows follow soldier enumeration order. Assignment entries naming a
/// soldier no longer on the roster are skipped.
pub fn compute_scores(
  soldiers: &[Soldier],
  duties: &[Duty],
  policy: ScorePolicy,
) -> Vec<JusticeBoardElement> {
  let mut totals: HashMap<&SoldierId, i64> =
    soldiers.iter().map(|s| (&s.id, 0)).collect();

  for duty in duties {
    if policy == ScorePolicy::ScheduledOnly
      && duty.status != DutyStatus::Scheduled
    {
      continue;
    }
    for soldier_id in &duty.soldiers {
      if let Some(total) = totals.get_mut(soldier_id) {
        *total += duty.value;
      }
    }
  }

  soldiers
    .iter()
    .map(|s| JusticeBoardElement { soldier_id: s.id.clone(), score: totals[&s.id] })
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

  fn duty(value: i64, status: DutyStatus, assigned: &[&str]) -> Duty {
    let now = Utc::now();
    let mut duty = NewDuty {
      name:              "d".into(),
      description:       String::new(),
      location:          GeoPoint { latitude: 0.0, longitude: 0.0 },
      start_time:        now + Duration::hours(1),
      end_time:          now + Duration::hours(2),
      min_rank:          None,
      max_rank:          None,
      constraints:       vec![],
      soldiers_required: 1,
      value,
    }
    .build(now)
    .unwrap();
    duty.soldiers =
      assigned.iter().map(|id| SoldierId::new(*id).unwrap()).collect();
    if status != DutyStatus::Unscheduled {
      duty.transition(status, now);
    }
    duty
  }

  #[test]
  fn unassigned_soldiers_score_zero() {
    let soldiers = [soldier("1000001"), soldier("1000002")];
    let duties = [duty(5, DutyStatus::Scheduled, &["1000001"])];

    let board = compute_scores(&soldiers, &duties, ScorePolicy::AllStatuses);
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].score, 5);
    assert_eq!(board[1].score, 0);
  }

  #[test]
  fn scores_accumulate_across_duties() {
    let soldiers = [soldier("1000001")];
    let duties = [
      duty(5, DutyStatus::Scheduled, &["1000001"]),
      duty(3, DutyStatus::Scheduled, &["1000001"]),
    ];

    let board = compute_scores(&soldiers, &duties, ScorePolicy::AllStatuses);
    assert_eq!(board[0].score, 8);
  }

  #[test]
  fn scheduled_only_ignores_other_statuses() {
    let soldiers = [soldier("1000001")];
    let duties = [
      duty(5, DutyStatus::Scheduled, &["1000001"]),
      duty(7, DutyStatus::Unscheduled, &["1000001"]),
      duty(11, DutyStatus::Canceled, &["1000001"]),
    ];

    let all = compute_scores(&soldiers, &duties, ScorePolicy::AllStatuses);
    assert_eq!(all[0].score, 23);

    let scheduled =
      compute_scores(&soldiers, &duties, ScorePolicy::ScheduledOnly);
    assert_eq!(scheduled[0].score, 5);
  }

  #[test]
  fn unknown_assignees_are_skipped() {
    let soldiers = [soldier("1000001")];
    let duties = [duty(5, DutyStatus::Scheduled, &["1000001", "9999999"])];

    let board = compute_scores(&soldiers, &duties, ScorePolicy::AllStatuses);
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].score, 5);
  }

  #[test]
  fn output_follows_soldier_enumeration_order() {
    let soldiers = [soldier("3000000"), soldier("1000000"), soldier("2000000")];
    let board = compute_scores(&soldiers, &[], ScorePolicy::AllStatuses);
    let ids: Vec<_> =
      board.iter().map(|e| e.soldier_id.as_str().to_owned()).collect();
    assert_eq!(ids, ["3000000", "1000000", "2000000"]);
  }
}
