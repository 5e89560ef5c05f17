//! # Storage Backend Trait
//!
//! The contract between the tracker and whatever keeps users, runs and
//! weekly reports. Listing methods take an optional [`Predicate`] and must
//! return exactly the records it accepts, in id order.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryBackend` | `memory` | In-memory for testing/embedding |

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::model::*;
use crate::search::{Literal, Predicate};
use crate::Result;

pub use memory::MemoryBackend;

/// The storage contract.
///
/// Ownership and role checks happen above this layer; a backend stores and
/// filters whatever it is asked to.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    // ========================================================================
    // Users
    // ========================================================================

    /// Create a user. Fails with `Conflict` if the username is taken.
    async fn create_user(&self, username: &str, role: Role) -> Result<User>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    async fn find_user(&self, username: &str) -> Result<Option<User>>;

    /// Delete a user together with their runs and reports.
    /// Returns true if the user existed.
    async fn delete_user(&self, id: UserId) -> Result<bool>;

    async fn scan_users(&self, filter: Option<&Predicate>) -> Result<Vec<User>>;

    // ========================================================================
    // Runs
    // ========================================================================

    async fn create_run(&self, owner: UserId, run: NewRun, weather: String) -> Result<Run>;

    async fn get_run(&self, id: RunId) -> Result<Option<Run>>;

    /// Replace a stored run. Fails with `NotFound` if it does not exist.
    async fn update_run(&self, run: Run) -> Result<()>;

    /// Delete a run, returning it if it existed.
    async fn delete_run(&self, id: RunId) -> Result<Option<Run>>;

    /// Runs of one owner (or of everyone, with `None`) accepted by `filter`.
    async fn scan_runs(&self, owner: Option<UserId>, filter: Option<&Predicate>) -> Result<Vec<Run>>;

    /// Runs of `owner` dated within `from..=to`.
    ///
    /// Default: a `scan_runs` with the equivalent date predicate.
    async fn runs_between(&self, owner: UserId, from: NaiveDate, to: NaiveDate) -> Result<Vec<Run>> {
        let range = Predicate::lt("date", Literal::Date(from.to_string()))
            .negate()
            .and(Predicate::gt("date", Literal::Date(to.to_string())).negate());
        self.scan_runs(Some(owner), Some(&range)).await
    }

    // ========================================================================
    // Weekly reports
    // ========================================================================

    /// Create or overwrite the report for `(owner, week_start)`.
    async fn upsert_report(
        &self,
        owner: UserId,
        week_start: NaiveDate,
        total_distance_km: f64,
        average_speed_kmph: f64,
    ) -> Result<WeeklyReport>;

    /// Returns true if a report existed.
    async fn delete_report(&self, owner: UserId, week_start: NaiveDate) -> Result<bool>;

    async fn get_report(&self, id: ReportId) -> Result<Option<WeeklyReport>>;

    async fn scan_reports(&self, owner: UserId, filter: Option<&Predicate>) -> Result<Vec<WeeklyReport>>;
}
