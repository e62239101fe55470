//! Attendance reconciliation engine
//!
//! Applies one normalized punch to the daily aggregate for its
//! `(employee, local day)` key. The merge itself is a pure function:
//! check-in only ever moves earlier, check-out only ever moves later,
//! and the day status is derived from the two instants. Replaying an
//! event is always a no-op, and a no-op neither bumps `updated_at` nor
//! reaches subscribers.
//!
//! Per-key serialization: every merge runs under an async mutex scoped
//! to its key, so same-key events reconcile one after the other while
//! events for other keys proceed fully in parallel.

use crate::db;
use crate::error::Result;
use chrono::{DateTime, NaiveDate, Utc};
use punchd_common::{
    time, DailyAttendance, DayStatus, LocalDayPolicy, MergeAction, PunchDirection,
};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// Apply one punch to an aggregate in memory, returning whether it
/// mutated anything
///
/// The degenerate first-punch-is-a-check-out day records the same
/// instant as both check-in and check-out and stays `Open` until a
/// strictly later check-out closes it.
pub fn merge(
    aggregate: &mut DailyAttendance,
    instant: DateTime<Utc>,
    direction: PunchDirection,
) -> bool {
    let mut mutated = false;

    match direction {
        PunchDirection::CheckIn => {
            if aggregate.check_in.map_or(true, |t| instant < t) {
                aggregate.check_in = Some(instant);
                mutated = true;
            }
        }
        PunchDirection::CheckOut => {
            if aggregate.check_in.is_none() {
                // Single-punch day: no prior check-in recorded
                aggregate.check_in = Some(instant);
                mutated = true;
            }
            if aggregate.check_out.map_or(true, |t| instant > t) {
                aggregate.check_out = Some(instant);
                mutated = true;
            }
        }
    }

    if mutated {
        aggregate.status = derive_status(aggregate);
    }
    mutated
}

/// Day status as a function of the two tracked instants
///
/// `Closed` requires a check-out strictly after the check-in; a
/// single-punch day (both instants equal) remains `Open`.
fn derive_status(aggregate: &DailyAttendance) -> DayStatus {
    match (aggregate.check_in, aggregate.check_out) {
        (None, None) => DayStatus::Absent,
        (_, None) => DayStatus::Open,
        (Some(check_in), Some(check_out)) if check_out > check_in => DayStatus::Closed,
        _ => DayStatus::Open,
    }
}

/// Serialized per-key reconciliation over the aggregate store
pub struct Reconciler {
    db: SqlitePool,
    policy: LocalDayPolicy,
    locks: Mutex<HashMap<(Uuid, NaiveDate), Arc<tokio::sync::Mutex<()>>>>,
}

impl Reconciler {
    pub fn new(db: SqlitePool, policy: LocalDayPolicy) -> Self {
        Self {
            db,
            policy,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &LocalDayPolicy {
        &self.policy
    }

    /// Reconcile one resolved, normalized punch into its daily aggregate
    ///
    /// Atomic with respect to other events for the same key; independent
    /// of events for other keys. Persists only when the merge mutated,
    /// stamping `updated_at` at write time.
    pub async fn reconcile(
        &self,
        employee_guid: Uuid,
        instant: DateTime<Utc>,
        direction: PunchDirection,
    ) -> Result<(DailyAttendance, MergeAction)> {
        let day = self.policy.local_day(instant);
        let lock = self.key_lock(employee_guid, day);
        let _guard = lock.lock().await;

        let existing = db::aggregates::get(&self.db, employee_guid, day).await?;
        let is_new = existing.is_none();
        let mut aggregate =
            existing.unwrap_or_else(|| DailyAttendance::absent(employee_guid, day, time::now()));

        let mutated = merge(&mut aggregate, instant, direction);
        let action = match (mutated, is_new) {
            (false, _) => MergeAction::Unchanged,
            (true, true) => MergeAction::Created,
            (true, false) => MergeAction::Updated,
        };

        if mutated {
            aggregate.updated_at = time::now();
            db::aggregates::upsert(&self.db, &aggregate).await?;
        }

        debug!(
            "Reconciled {:?} punch for {} on {}: {}",
            direction,
            employee_guid,
            day,
            action.as_str()
        );
        Ok((aggregate, action))
    }

    fn key_lock(&self, employee_guid: Uuid, day: NaiveDate) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().expect("key lock table poisoned");
        locks
            .entry((employee_guid, day))
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
