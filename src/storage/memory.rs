//! In-memory storage backend.
//!
//! This is the reference implementation of `StorageBackend`.
//! It uses simple HashMaps protected by RwLock.
//!
//! ## Limitations
//!
//! - **No persistence**: everything is gone when the backend is dropped.
//! - **Per-collection locks**: a user delete touches several maps one after
//!   another; concurrent readers may observe the intermediate state.
//! - **Full scans**: every listing evaluates the predicate against every
//!   record of the collection.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use hashbrown::HashMap;
use parking_lot::RwLock;

use super::StorageBackend;
use crate::model::*;
use crate::search::Predicate;
use crate::{Error, Result};

// ============================================================================
// MemoryBackend
// ============================================================================

/// In-memory store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    users: RwLock<HashMap<UserId, User>>,
    runs: RwLock<HashMap<RunId, Run>>,
    reports: RwLock<HashMap<ReportId, WeeklyReport>>,
    /// (owner, week start) → report
    report_index: RwLock<HashMap<(UserId, NaiveDate), ReportId>>,
    next_user_id: AtomicU64,
    next_run_id: AtomicU64,
    next_report_id: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.inner.users.read().len()
    }

    pub fn run_count(&self) -> usize {
        self.inner.runs.read().len()
    }

    pub fn report_count(&self) -> usize {
        self.inner.reports.read().len()
    }
}

/// Ids start at 1.
fn next_id(counter: &AtomicU64) -> u64 {
    counter.fetch_add(1, Ordering::Relaxed) + 1
}

/// Clone out every record accepted by `keep` and `filter`.
fn scan<'a, R: Record + Clone + 'a>(
    records: impl Iterator<Item = &'a R>,
    keep: impl Fn(&R) -> bool,
    filter: Option<&Predicate>,
) -> Result<Vec<R>> {
    if let Some(p) = filter {
        p.validate_for::<R>()?;
    }
    let mut out = Vec::new();
    for record in records.filter(|r| keep(r)) {
        if let Some(p) = filter {
            if !p.evaluate(record)? {
                continue;
            }
        }
        out.push(record.clone());
    }
    Ok(out)
}

// ============================================================================
// StorageBackend impl
// ============================================================================

#[async_trait]
impl StorageBackend for MemoryBackend {
    // ========================================================================
    // Users
    // ========================================================================

    async fn create_user(&self, username: &str, role: Role) -> Result<User> {
        let mut users = self.inner.users.write();
        if users.values().any(|u| u.username == username) {
            return Err(Error::Conflict(format!("username '{username}' is already taken")));
        }
        let user = User {
            id: UserId(next_id(&self.inner.next_user_id)),
            username: username.to_string(),
            role,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.inner.users.read().get(&id).cloned())
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>> {
        Ok(self.inner.users.read().values().find(|u| u.username == username).cloned())
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        let removed = self.inner.users.write().remove(&id);
        if removed.is_none() {
            return Ok(false);
        }

        self.inner.runs.write().retain(|_, run| run.owner != id);
        self.inner.reports.write().retain(|_, report| report.owner != id);
        self.inner.report_index.write().retain(|(owner, _), _| *owner != id);
        Ok(true)
    }

    async fn scan_users(&self, filter: Option<&Predicate>) -> Result<Vec<User>> {
        let users = self.inner.users.read();
        let mut out = scan(users.values(), |_| true, filter)?;
        out.sort_by_key(|u| u.id);
        Ok(out)
    }

    // ========================================================================
    // Runs
    // ========================================================================

    async fn create_run(&self, owner: UserId, run: NewRun, weather: String) -> Result<Run> {
        let run = Run {
            id: RunId(next_id(&self.inner.next_run_id)),
            date: run.date,
            distance: run.distance,
            time: run.time,
            location: run.location,
            owner,
            weather,
        };
        self.inner.runs.write().insert(run.id, run.clone());
        Ok(run)
    }

    async fn get_run(&self, id: RunId) -> Result<Option<Run>> {
        Ok(self.inner.runs.read().get(&id).cloned())
    }

    async fn update_run(&self, run: Run) -> Result<()> {
        let mut runs = self.inner.runs.write();
        let slot = runs.get_mut(&run.id).ok_or_else(|| Error::NotFound(format!("run {}", run.id)))?;
        *slot = run;
        Ok(())
    }

    async fn delete_run(&self, id: RunId) -> Result<Option<Run>> {
        Ok(self.inner.runs.write().remove(&id))
    }

    async fn scan_runs(&self, owner: Option<UserId>, filter: Option<&Predicate>) -> Result<Vec<Run>> {
        let runs = self.inner.runs.read();
        let mut out = scan(runs.values(), |r| owner.is_none_or(|o| r.owner == o), filter)?;
        out.sort_by_key(|r| r.id);
        Ok(out)
    }

    // ========================================================================
    // Weekly reports
    // ========================================================================

    async fn upsert_report(
        &self,
        owner: UserId,
        week_start: NaiveDate,
        total_distance_km: f64,
        average_speed_kmph: f64,
    ) -> Result<WeeklyReport> {
        let mut index = self.inner.report_index.write();
        let mut reports = self.inner.reports.write();

        let id = *index
            .entry((owner, week_start))
            .or_insert_with(|| ReportId(next_id(&self.inner.next_report_id)));
        let report = WeeklyReport {
            id,
            owner,
            week_start,
            total_distance_km,
            average_speed_kmph,
        };
        reports.insert(id, report.clone());
        Ok(report)
    }

    async fn delete_report(&self, owner: UserId, week_start: NaiveDate) -> Result<bool> {
        let mut index = self.inner.report_index.write();
        match index.remove(&(owner, week_start)) {
            Some(id) => Ok(self.inner.reports.write().remove(&id).is_some()),
            None => Ok(false),
        }
    }

    async fn get_report(&self, id: ReportId) -> Result<Option<WeeklyReport>> {
        Ok(self.inner.reports.read().get(&id).cloned())
    }

    async fn scan_reports(&self, owner: UserId, filter: Option<&Predicate>) -> Result<Vec<WeeklyReport>> {
        let reports = self.inner.reports.read();
        let mut out = scan(reports.values(), |r| r.owner == owner, filter)?;
        out.sort_by_key(|r| r.id);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_run(day: NaiveDate, distance: f64, location: &str) -> NewRun {
        NewRun::new(day, distance, TimeDelta::minutes(30), location)
    }

    #[tokio::test]
    async fn test_usernames_are_unique() {
        let db = MemoryBackend::new();
        let bob = db.create_user("bob", Role::Regular).await.unwrap();
        assert_eq!(bob.id, UserId(1));
        assert!(matches!(db.create_user("bob", Role::Admin).await, Err(Error::Conflict(_))));
        assert_eq!(db.user_count(), 1);
        assert_eq!(db.find_user("bob").await.unwrap(), Some(bob));
    }

    #[tokio::test]
    async fn test_scan_runs_by_owner_and_filter() {
        let db = MemoryBackend::new();
        let bob = db.create_user("bob", Role::Regular).await.unwrap();
        let mike = db.create_user("mike", Role::Regular).await.unwrap();
        db.create_run(bob.id, new_run(date(2020, 10, 5), 2.5, "Buenos Aires"), "?".into()).await.unwrap();
        db.create_run(bob.id, new_run(date(2020, 10, 6), 5.4, "Buenos Aires"), "?".into()).await.unwrap();
        db.create_run(mike.id, new_run(date(2020, 10, 6), 6.2, "Buenos Aires"), "?".into()).await.unwrap();

        assert_eq!(db.scan_runs(Some(bob.id), None).await.unwrap().len(), 2);
        assert_eq!(db.scan_runs(None, None).await.unwrap().len(), 3);

        let far = Predicate::gt("distance", 5.0);
        let ids: Vec<RunId> = db.scan_runs(None, Some(&far)).await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RunId(2), RunId(3)]);
    }

    #[tokio::test]
    async fn test_scan_rejects_unknown_fields_even_when_empty() {
        let db = MemoryBackend::new();
        let bad = Predicate::eq("pace", 4.0);
        assert!(matches!(db.scan_runs(None, Some(&bad)).await, Err(Error::UnknownField { .. })));
    }

    #[tokio::test]
    async fn test_runs_between_is_inclusive() {
        let db = MemoryBackend::new();
        let bob = db.create_user("bob", Role::Regular).await.unwrap();
        for day in [date(2020, 9, 27), date(2020, 9, 28), date(2020, 10, 4), date(2020, 10, 5)] {
            db.create_run(bob.id, new_run(day, 8.4, "Buenos Aires"), "?".into()).await.unwrap();
        }
        let week = db.runs_between(bob.id, date(2020, 9, 28), date(2020, 10, 4)).await.unwrap();
        let days: Vec<NaiveDate> = week.iter().map(|r| r.date).collect();
        assert_eq!(days, vec![date(2020, 9, 28), date(2020, 10, 4)]);
    }

    #[tokio::test]
    async fn test_upsert_report_keeps_one_per_week() {
        let db = MemoryBackend::new();
        let bob = db.create_user("bob", Role::Regular).await.unwrap();
        let first = db.upsert_report(bob.id, date(2020, 10, 5), 5.0, 10.0).await.unwrap();
        let second = db.upsert_report(bob.id, date(2020, 10, 5), 7.9, 11.0).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(db.report_count(), 1);
        assert_eq!(db.get_report(first.id).await.unwrap().unwrap().total_distance_km, 7.9);

        assert!(db.delete_report(bob.id, date(2020, 10, 5)).await.unwrap());
        assert!(!db.delete_report(bob.id, date(2020, 10, 5)).await.unwrap());
        assert_eq!(db.report_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let db = MemoryBackend::new();
        let bob = db.create_user("bob", Role::Regular).await.unwrap();
        db.create_run(bob.id, new_run(date(2020, 10, 5), 2.5, "Madrid"), "?".into()).await.unwrap();
        db.upsert_report(bob.id, date(2020, 10, 5), 2.5, 10.0).await.unwrap();

        assert!(db.delete_user(bob.id).await.unwrap());
        assert_eq!(db.run_count(), 0);
        assert_eq!(db.report_count(), 0);
        assert!(!db.delete_user(bob.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_missing_run() {
        let db = MemoryBackend::new();
        let bob = db.create_user("bob", Role::Regular).await.unwrap();
        let mut run = db.create_run(bob.id, new_run(date(2020, 10, 5), 2.5, "Madrid"), "?".into()).await.unwrap();
        db.delete_run(run.id).await.unwrap();
        run.location = "Tokyo".into();
        assert!(matches!(db.update_run(run).await, Err(Error::NotFound(_))));
    }
}
