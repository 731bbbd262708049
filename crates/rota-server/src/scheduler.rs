//! Periodic duty scheduler — the lifecycle driver.
//!
//! Each tick re-scans all duties, re-derives eligibility and selection from
//! scratch, and commits one status transition per scheduled duty. The driver
//! is stateless across ticks apart from the per-duty in-flight guard, which
//! prevents double assignment should two passes ever run concurrently.
//!
//! Soldier and duty collections are re-fetched per candidate duty, so a
//! commit made earlier in the same pass is visible to the conflict checks of
//! every later duty.

use std::{
  collections::HashSet,
  sync::{Arc, Mutex},
  time::Duration,
};

use chrono::{DateTime, Utc};
use rota_core::{duty::DutyStatus, plan, store::RosterStore};
use uuid::Uuid;

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
  /// Wall-clock interval between passes.
  pub tick_interval:  Duration,
  /// Minimum number of selected soldiers required to flip a duty to
  /// `scheduled`. Values below 1 are treated as 1.
  pub min_candidates: usize,
}

impl Default for SchedulerConfig {
  fn default() -> Self {
    Self { tick_interval: Duration::from_secs(300), min_candidates: 1 }
  }
}

/// Counters for one scheduling pass; used for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
  /// Candidate duties examined.
  pub examined:  usize,
  /// Duties flipped to `scheduled` this pass.
  pub scheduled: usize,
  /// Duties whose commit failed; left unchanged.
  pub failed:    usize,
  /// Duties skipped because another pass already holds them.
  pub in_flight: usize,
}

// ─── Scheduler ────────────────────────────────────────────────────────────────

pub struct Scheduler<S> {
  store:     Arc<S>,
  config:    SchedulerConfig,
  in_flight: Mutex<HashSet<Uuid>>,
}

impl<S> Scheduler<S>
where
  S: RosterStore,
{
  pub fn new(store: Arc<S>, config: SchedulerConfig) -> Self {
    Self { store, config, in_flight: Mutex::new(HashSet::new()) }
  }

  /// Run passes forever on the configured interval. The first pass fires
  /// immediately.
  pub async fn run(self) {
    let mut interval = tokio::time::interval(self.config.tick_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
      interval.tick().await;
      match self.run_pass(Utc::now()).await {
        Ok(summary) => tracing::debug!(
          examined = summary.examined,
          scheduled = summary.scheduled,
          failed = summary.failed,
          "scheduling pass complete"
        ),
        Err(error) => tracing::error!(%error, "scheduling pass aborted"),
      }
    }
  }

  /// One full scheduling pass. A per-duty failure is logged and skipped;
  /// only a failure to list the duty collection aborts the pass.
  pub async fn run_pass(
    &self,
    now: DateTime<Utc>,
  ) -> Result<PassSummary, S::Error> {
    let candidate_ids: Vec<Uuid> = self
      .store
      .list_duties()
      .await?
      .iter()
      .filter(|duty| plan::is_candidate(duty, now))
      .map(|duty| duty.duty_id)
      .collect();

    let mut summary = PassSummary::default();
    for duty_id in candidate_ids {
      summary.examined += 1;

      if !self.begin(duty_id) {
        summary.in_flight += 1;
        continue;
      }
      let outcome = self.schedule_one(duty_id, now).await;
      self.finish(duty_id);

      match outcome {
        Ok(true) => summary.scheduled += 1,
        Ok(false) => {}
        Err(error) => {
          summary.failed += 1;
          tracing::warn!(
            %duty_id,
            %error,
            "commit failed; duty left unchanged"
          );
        }
      }
    }
    Ok(summary)
  }

  /// Plan and commit one duty. `Ok(false)` means "nothing to do": the duty
  /// vanished, stopped being a candidate, or selection came up short.
  async fn schedule_one(
    &self,
    duty_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<bool, S::Error> {
    // Fresh snapshot per duty: commits earlier in this pass must count as
    // scheduled conflicts for this one.
    let all_duties = self.store.list_duties().await?;
    let soldiers = self.store.list_soldiers().await?;

    let Some(duty) = all_duties.iter().find(|d| d.duty_id == duty_id) else {
      tracing::debug!(%duty_id, "duty vanished mid-pass; skipping");
      return Ok(false);
    };

    let Some(assignment) =
      plan::plan_duty(duty, &soldiers, &all_duties, now, self.config.min_candidates)
    else {
      return Ok(false);
    };

    let committed = self
      .store
      .commit_duty_assignment(
        assignment.duty_id,
        assignment.soldier_ids.clone(),
        DutyStatus::Scheduled,
        assignment.decided_at,
      )
      .await?;
    if !committed {
      tracing::debug!(%duty_id, "duty vanished before commit; skipping");
      return Ok(false);
    }

    tracing::info!(
      %duty_id,
      soldiers = assignment.soldier_ids.len(),
      "duty scheduled"
    );
    Ok(true)
  }

  fn begin(&self, duty_id: Uuid) -> bool {
    self.in_flight.lock().expect("in-flight lock poisoned").insert(duty_id)
  }

  fn finish(&self, duty_id: Uuid) {
    self.in_flight.lock().expect("in-flight lock poisoned").remove(&duty_id);
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::Mutex as StdMutex;

  use chrono::Duration as ChronoDuration;
  use rota_core::{
    duty::{Duty, DutyPatch, GeoPoint, NewDuty, StatusChange},
    soldier::{NewSoldier, Rank, Soldier, SoldierId, SoldierPatch},
  };

  use super::*;

  #[derive(Debug, thiserror::Error)]
  enum MockError {
    #[error("commit refused")]
    CommitRefused,
  }

  /// In-memory store; commits for duty ids in `fail_commits` are refused
  /// without mutating anything.
  struct MockStore {
    soldiers:     StdMutex<Vec<Soldier>>,
    duties:       StdMutex<Vec<Duty>>,
    fail_commits: HashSet<Uuid>,
  }

  impl MockStore {
    fn new(soldiers: Vec<Soldier>, duties: Vec<Duty>) -> Self {
      Self {
        soldiers:     StdMutex::new(soldiers),
        duties:       StdMutex::new(duties),
        fail_commits: HashSet::new(),
      }
    }

    fn duty(&self, id: Uuid) -> Duty {
      self
        .duties
        .lock()
        .unwrap()
        .iter()
        .find(|d| d.duty_id == id)
        .cloned()
        .unwrap()
    }
  }

  impl RosterStore for MockStore {
    type Error = MockError;

    async fn add_soldier(&self, _: NewSoldier) -> Result<Soldier, MockError> {
      unimplemented!()
    }

    async fn get_soldier(
      &self,
      id: &SoldierId,
    ) -> Result<Option<Soldier>, MockError> {
      Ok(self.soldiers.lock().unwrap().iter().find(|s| &s.id == id).cloned())
    }

    async fn list_soldiers(&self) -> Result<Vec<Soldier>, MockError> {
      Ok(self.soldiers.lock().unwrap().clone())
    }

    async fn update_soldier(
      &self,
      _: &SoldierId,
      _: SoldierPatch,
    ) -> Result<Option<Soldier>, MockError> {
      unimplemented!()
    }

    async fn delete_soldier(&self, _: &SoldierId) -> Result<bool, MockError> {
      unimplemented!()
    }

    async fn add_duty(&self, _: NewDuty) -> Result<Duty, MockError> {
      unimplemented!()
    }

    async fn get_duty(&self, id: Uuid) -> Result<Option<Duty>, MockError> {
      Ok(self.duties.lock().unwrap().iter().find(|d| d.duty_id == id).cloned())
    }

    async fn list_duties(&self) -> Result<Vec<Duty>, MockError> {
      Ok(self.duties.lock().unwrap().clone())
    }

    async fn update_duty(
      &self,
      _: Uuid,
      _: DutyPatch,
    ) -> Result<Option<Duty>, MockError> {
      unimplemented!()
    }

    async fn delete_duty(&self, _: Uuid) -> Result<bool, MockError> {
      unimplemented!()
    }

    async fn cancel_duty(&self, _: Uuid) -> Result<Option<Duty>, MockError> {
      unimplemented!()
    }

    async fn commit_duty_assignment(
      &self,
      duty_id: Uuid,
      soldier_ids: Vec<SoldierId>,
      new_status: DutyStatus,
      at: DateTime<Utc>,
    ) -> Result<bool, MockError> {
      if self.fail_commits.contains(&duty_id) {
        return Err(MockError::CommitRefused);
      }
      let mut duties = self.duties.lock().unwrap();
      let Some(duty) = duties.iter_mut().find(|d| d.duty_id == duty_id)
      else {
        return Ok(false);
      };
      duty.soldiers = soldier_ids;
      duty.status = new_status;
      duty.status_history.push(StatusChange { status: new_status, at });
      duty.updated_at = at;
      Ok(true)
    }
  }

  fn soldier(id: &str) -> Soldier {
    NewSoldier {
      id:          SoldierId::new(id).unwrap(),
      name:        format!("soldier {id}"),
      rank:        Rank::Private,
      limitations: vec![],
    }
    .build(Utc::now())
  }

  fn duty(
    now: DateTime<Utc>,
    start_hours: i64,
    end_hours: i64,
    required: u32,
    value: i64,
  ) -> Duty {
    NewDuty {
      name:              "d".into(),
      description:       String::new(),
      location:          GeoPoint { latitude: 0.0, longitude: 0.0 },
      start_time:        now + ChronoDuration::hours(start_hours),
      end_time:          now + ChronoDuration::hours(end_hours),
      min_rank:          None,
      max_rank:          None,
      constraints:       vec![],
      soldiers_required: required,
      value,
    }
    .build(now)
    .unwrap()
  }

  fn scheduler(store: MockStore) -> Scheduler<MockStore> {
    Scheduler::new(Arc::new(store), SchedulerConfig::default())
  }

  #[tokio::test]
  async fn pass_schedules_future_unscheduled_duties() {
    let now = Utc::now();
    let d = duty(now, 2, 10, 1, 3);
    let duty_id = d.duty_id;
    let store = MockStore::new(vec![soldier("1000001")], vec![d]);
    let sched = scheduler(store);

    let summary = sched.run_pass(now).await.unwrap();
    assert_eq!(summary.scheduled, 1);
    assert_eq!(summary.failed, 0);

    let committed = sched.store.duty(duty_id);
    assert_eq!(committed.status, DutyStatus::Scheduled);
    assert_eq!(committed.soldiers, [SoldierId::new("1000001").unwrap()]);
    assert_eq!(committed.status_history.len(), 2);
  }

  #[tokio::test]
  async fn pass_skips_scheduled_canceled_and_stale_duties() {
    let now = Utc::now();
    let mut scheduled = duty(now, 2, 10, 1, 3);
    scheduled.transition(DutyStatus::Scheduled, now);
    let mut canceled = duty(now, 2, 10, 1, 3);
    canceled.transition(DutyStatus::Canceled, now);
    let stale = duty(now - ChronoDuration::hours(5), 1, 3, 1, 3);

    let store = MockStore::new(
      vec![soldier("1000001")],
      vec![scheduled, canceled, stale],
    );
    let sched = scheduler(store);

    let summary = sched.run_pass(now).await.unwrap();
    assert_eq!(summary, PassSummary::default());
  }

  #[tokio::test]
  async fn pass_skips_duty_with_no_eligible_soldiers() {
    let now = Utc::now();
    let mut d = duty(now, 2, 10, 1, 3);
    d.constraints = vec!["dust".into()];
    let duty_id = d.duty_id;

    let mut limited = soldier("1000001");
    limited.limitations = vec!["dust".into()];

    let store = MockStore::new(vec![limited], vec![d]);
    let sched = scheduler(store);

    let summary = sched.run_pass(now).await.unwrap();
    assert_eq!(summary.examined, 1);
    assert_eq!(summary.scheduled, 0);
    assert_eq!(sched.store.duty(duty_id).status, DutyStatus::Unscheduled);
  }

  #[tokio::test]
  async fn commit_failure_leaves_duty_unchanged_and_pass_continues() {
    let now = Utc::now();
    let failing = duty(now, 2, 10, 1, 3);
    let failing_id = failing.duty_id;
    // Does not overlap the failing duty, so both have candidates.
    let healthy = duty(now, 20, 30, 1, 3);
    let healthy_id = healthy.duty_id;

    let mut store =
      MockStore::new(vec![soldier("1000001")], vec![failing, healthy]);
    store.fail_commits.insert(failing_id);
    let sched = scheduler(store);

    let summary = sched.run_pass(now).await.unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.scheduled, 1);

    // The failing duty kept its status and history.
    let untouched = sched.store.duty(failing_id);
    assert_eq!(untouched.status, DutyStatus::Unscheduled);
    assert_eq!(untouched.status_history.len(), 1);
    assert!(untouched.soldiers.is_empty());

    assert_eq!(sched.store.duty(healthy_id).status, DutyStatus::Scheduled);
  }

  #[tokio::test]
  async fn commits_earlier_in_a_pass_block_overlapping_later_duties() {
    let now = Utc::now();
    // Two fully overlapping duties, one soldier: only the first may get him.
    let first = duty(now, 2, 10, 1, 3);
    let second = duty(now, 3, 9, 1, 3);
    let first_id = first.duty_id;
    let second_id = second.duty_id;

    let store = MockStore::new(vec![soldier("1000001")], vec![first, second]);
    let sched = scheduler(store);

    let summary = sched.run_pass(now).await.unwrap();
    assert_eq!(summary.scheduled, 1);

    assert_eq!(sched.store.duty(first_id).status, DutyStatus::Scheduled);
    assert_eq!(sched.store.duty(second_id).status, DutyStatus::Unscheduled);
  }

  #[tokio::test]
  async fn fairness_prefers_lower_scheduled_score() {
    let now = Utc::now();
    let candidate = duty(now, 2, 10, 1, 3);
    let candidate_id = candidate.duty_id;

    // Soldier 1 already holds a non-overlapping scheduled duty worth 9.
    let mut held = duty(now, 20, 30, 1, 9);
    held.soldiers = vec![SoldierId::new("1000001").unwrap()];
    held.transition(DutyStatus::Scheduled, now);

    let store = MockStore::new(
      vec![soldier("1000001"), soldier("1000002")],
      vec![candidate, held],
    );
    let sched = scheduler(store);

    sched.run_pass(now).await.unwrap();
    assert_eq!(
      sched.store.duty(candidate_id).soldiers,
      [SoldierId::new("1000002").unwrap()]
    );
  }

  #[tokio::test]
  async fn min_candidates_threshold_blocks_understaffed_scheduling() {
    let now = Utc::now();
    let d = duty(now, 2, 10, 3, 3);
    let duty_id = d.duty_id;
    let store = MockStore::new(vec![soldier("1000001")], vec![d]);

    let sched = Scheduler::new(
      Arc::new(store),
      SchedulerConfig { min_candidates: 2, ..SchedulerConfig::default() },
    );

    let summary = sched.run_pass(now).await.unwrap();
    assert_eq!(summary.scheduled, 0);
    assert_eq!(sched.store.duty(duty_id).status, DutyStatus::Unscheduled);
  }

  #[tokio::test]
  async fn in_flight_duties_are_not_touched() {
    let now = Utc::now();
    let d = duty(now, 2, 10, 1, 3);
    let duty_id = d.duty_id;
    let store = MockStore::new(vec![soldier("1000001")], vec![d]);
    let sched = scheduler(store);

    sched.in_flight.lock().unwrap().insert(duty_id);
    let summary = sched.run_pass(now).await.unwrap();
    assert_eq!(summary.in_flight, 1);
    assert_eq!(summary.scheduled, 0);
    assert_eq!(sched.store.duty(duty_id).status, DutyStatus::Unscheduled);
  }
}
