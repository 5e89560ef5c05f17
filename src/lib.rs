//! # runlog: Jogging Time Tracker Core
//!
//! Users log runs (date, distance, time, location); each run is tagged
//! with the day's weather, and every run change recomputes the owner's
//! weekly report. Listings accept a small search language:
//!
//! ```text
//! (date eq '2020-10-23') AND ((distance gt 20) OR (distance lt 10))
//! ```
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `StorageBackend` is the contract between the tracker and storage
//! 2. **Parser owns nothing**: search text → `Predicate` is a pure function
//! 3. **Injected collaborators**: weather providers are resolved by name from a registry
//! 4. **Checks above storage**: roles and ownership are enforced by `Tracker`, never by backends
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chrono::{NaiveDate, TimeDelta};
//! use runlog::{Caller, Config, ListParams, NewRun, Tracker, WeatherRegistry};
//!
//! # async fn example() -> runlog::Result<()> {
//! let tracker = Tracker::open_memory(Config::default(), &WeatherRegistry::new())?;
//! let bob = tracker.new_account("bob").await?;
//! let caller = Caller::from(&bob);
//!
//! let date = NaiveDate::from_ymd_opt(2020, 10, 5).unwrap_or_default();
//! tracker.log_run(&caller, NewRun::new(date, 10.2, TimeDelta::minutes(55), "Madrid")).await?;
//!
//! let params = ListParams::new().search(r#"(distance gt 10) AND (location eq "Madrid")"#);
//! let page = tracker.list_runs(&caller, &params).await?;
//! assert_eq!(page.count, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Storage Backends
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | Memory | (default) | In-memory store for testing/embedding |

// ============================================================================
// Modules
// ============================================================================

pub mod access;
pub mod config;
pub mod listing;
pub mod model;
pub mod search;
pub mod stats;
pub mod storage;
pub mod weather;

use std::sync::Arc;

use chrono::NaiveDate;

// ============================================================================
// Re-exports
// ============================================================================

pub use access::Caller;
pub use config::Config;
pub use listing::{ListParams, Page};
pub use model::{
    NewRun, Record, ReportId, Role, Run, RunId, RunPatch, User, UserId, WeeklyReport,
    UNKNOWN_WEATHER,
};
pub use search::{Comparison, Literal, Predicate, SyntaxError};
pub use stats::WeekStats;
pub use storage::{MemoryBackend, StorageBackend};
pub use weather::{LookupError, StaticWeather, Weather, WeatherProvider, WeatherRegistry};

// ============================================================================
// Top-level Tracker handle
// ============================================================================

/// The primary entry point. A `Tracker` wraps a storage backend and
/// applies role checks, weather enrichment and report upkeep.
pub struct Tracker<B: StorageBackend> {
    backend: B,
    config: Config,
    weather: Option<Arc<dyn WeatherProvider>>,
}

impl<B: StorageBackend> Tracker<B> {
    /// Create a tracker over `backend`, resolving the configured weather
    /// provider from `registry`.
    pub fn with_backend(backend: B, config: Config, registry: &WeatherRegistry) -> Result<Self> {
        config.validate()?;
        let weather = match config.weather.provider.as_deref() {
            Some(name) => Some(registry.resolve(name)?),
            None => None,
        };
        Ok(Self { backend, config, weather })
    }

    /// Access the underlying backend (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Self-service sign-up; the new account is always `Regular`.
    pub async fn new_account(&self, username: &str) -> Result<User> {
        validate_username(username)?;
        let user = self.backend.create_user(username, Role::Regular).await?;
        tracing::info!(user = %user.id, username, "account created");
        Ok(user)
    }

    pub async fn create_user(&self, caller: &Caller, username: &str, role: Role) -> Result<User> {
        caller.require_role_manager(role)?;
        validate_username(username)?;
        let user = self.backend.create_user(username, role).await?;
        tracing::info!(user = %user.id, username, %role, by = %caller.id, "user created");
        Ok(user)
    }

    pub async fn get_user(&self, caller: &Caller, id: UserId) -> Result<User> {
        caller.require_user_manager()?;
        self.backend
            .get_user(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user {id}")))
    }

    pub async fn list_users(&self, caller: &Caller, params: &ListParams) -> Result<Page<User>> {
        caller.require_user_manager()?;
        let filter = self.filter(params)?;
        let users = self.backend.scan_users(filter.as_ref()).await?;
        tracing::debug!(matched = users.len(), "listed users");
        self.paginate(users, params)
    }

    /// Remove an account along with its runs and reports.
    pub async fn delete_user(&self, caller: &Caller, id: UserId) -> Result<()> {
        let user = self.get_user(caller, id).await?;
        caller.require_role_manager(user.role)?;
        self.backend.delete_user(id).await?;
        tracing::info!(user = %id, by = %caller.id, "user deleted");
        Ok(())
    }

    // ========================================================================
    // Runs
    // ========================================================================

    /// Record a run for the caller.
    pub async fn log_run(&self, caller: &Caller, run: NewRun) -> Result<Run> {
        run.validate()?;
        let weather = self.weather_for(&run.location, run.date).await;
        let run = self.backend.create_run(caller.id, run, weather).await?;
        tracing::info!(run = %run.id, owner = %run.owner, date = %run.date, "run logged");
        self.refresh_week(run.owner, run.date).await?;
        Ok(run)
    }

    /// Fetch a run. Runs outside the caller's scope are reported as missing.
    pub async fn get_run(&self, caller: &Caller, id: RunId) -> Result<Run> {
        match self.backend.get_run(id).await? {
            Some(run) if caller.can_access_run(&run) => Ok(run),
            _ => Err(Error::NotFound(format!("run {id}"))),
        }
    }

    pub async fn list_runs(&self, caller: &Caller, params: &ListParams) -> Result<Page<Run>> {
        let filter = self.filter(params)?;
        let runs = self.backend.scan_runs(caller.run_scope(), filter.as_ref()).await?;
        tracing::debug!(caller = %caller.id, matched = runs.len(), "listed runs");
        self.paginate(runs, params)
    }

    /// Partial update. Weather is looked up again when the date or location
    /// changes; both the old and the new week are recomputed.
    pub async fn update_run(&self, caller: &Caller, id: RunId, patch: RunPatch) -> Result<Run> {
        let current = self.get_run(caller, id).await?;
        patch.validate()?;
        let next = patch.apply(&current);

        let weather = if next.date != current.date || next.location != current.location {
            self.weather_for(&next.location, next.date).await
        } else {
            current.weather.clone()
        };
        let updated = Run {
            id: current.id,
            date: next.date,
            distance: next.distance,
            time: next.time,
            location: next.location,
            owner: current.owner,
            weather,
        };
        self.backend.update_run(updated.clone()).await?;
        tracing::info!(run = %id, by = %caller.id, "run updated");

        self.refresh_week(current.owner, current.date).await?;
        if stats::week_bounds(current.date)? != stats::week_bounds(updated.date)? {
            self.refresh_week(updated.owner, updated.date).await?;
        }
        Ok(updated)
    }

    /// Full update: every user-supplied field is replaced.
    pub async fn replace_run(&self, caller: &Caller, id: RunId, run: NewRun) -> Result<Run> {
        self.update_run(caller, id, run.into()).await
    }

    pub async fn delete_run(&self, caller: &Caller, id: RunId) -> Result<()> {
        let run = self.get_run(caller, id).await?;
        if self.backend.delete_run(id).await?.is_none() {
            return Err(Error::NotFound(format!("run {id}")));
        }
        tracing::info!(run = %id, by = %caller.id, "run deleted");
        self.refresh_week(run.owner, run.date).await
    }

    // ========================================================================
    // Weekly reports
    // ========================================================================

    /// The caller's own weekly reports, whatever their role.
    pub async fn list_weekly_reports(&self, caller: &Caller, params: &ListParams) -> Result<Page<WeeklyReport>> {
        let filter = self.filter(params)?;
        let reports = self.backend.scan_reports(caller.id, filter.as_ref()).await?;
        tracing::debug!(caller = %caller.id, matched = reports.len(), "listed weekly reports");
        self.paginate(reports, params)
    }

    pub async fn get_weekly_report(&self, caller: &Caller, id: ReportId) -> Result<WeeklyReport> {
        match self.backend.get_report(id).await? {
            Some(report) if caller.can_access_report(&report) => Ok(report),
            _ => Err(Error::NotFound(format!("weekly report {id}"))),
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn filter(&self, params: &ListParams) -> Result<Option<Predicate>> {
        params
            .predicate(self.config.search.lex_mode())
            .inspect_err(|err| tracing::warn!(error = %err, "rejected list filter"))
    }

    fn paginate<T>(&self, items: Vec<T>, params: &ListParams) -> Result<Page<T>> {
        Page::paginate(items, params, &self.config.pagination)
    }

    /// The provider's description, or the placeholder when there is no
    /// provider or the lookup fails.
    async fn weather_for(&self, location: &str, date: NaiveDate) -> String {
        let Some(provider) = &self.weather else {
            return UNKNOWN_WEATHER.to_string();
        };
        match provider.weather(location, date).await {
            Ok(weather) if !weather.0.is_empty() => weather.into_inner(),
            Ok(_) => UNKNOWN_WEATHER.to_string(),
            Err(err) => {
                tracing::warn!(location, %date, error = %err, "weather lookup failed, storing placeholder");
                UNKNOWN_WEATHER.to_string()
            }
        }
    }

    /// Recompute the report for the week containing `date`; an empty week
    /// loses its report.
    async fn refresh_week(&self, owner: UserId, date: NaiveDate) -> Result<()> {
        let (monday, sunday) = stats::week_bounds(date)?;
        let runs = self.backend.runs_between(owner, monday, sunday).await?;
        let week = WeekStats::from_runs(&runs);

        if week.is_empty() {
            if self.backend.delete_report(owner, monday).await? {
                tracing::info!(%owner, week_start = %monday, "weekly report removed");
            }
            return Ok(());
        }

        let report = self
            .backend
            .upsert_report(owner, monday, week.total_distance_km, week.average_speed_kmph())
            .await?;
        tracing::info!(
            %owner,
            report = %report.id,
            week_start = %monday,
            runs = week.runs,
            "weekly report recomputed"
        );
        Ok(())
    }
}

/// In-memory tracker for testing and embedding.
impl Tracker<storage::MemoryBackend> {
    pub fn open_memory(config: Config, registry: &WeatherRegistry) -> Result<Self> {
        Self::with_backend(storage::MemoryBackend::new(), config, registry)
    }
}

/// Usernames: 1 to 150 characters of letters, digits and `@.+-_`.
fn validate_username(username: &str) -> Result<()> {
    let valid_char = |c: char| c.is_alphanumeric() || "@.+-_".contains(c);
    if username.is_empty() || username.chars().count() > 150 || !username.chars().all(valid_char) {
        return Err(Error::InvalidInput(format!(
            "invalid username '{username}': use 1-150 letters, digits or @.+-_"
        )));
    }
    Ok(())
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Search syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("Unknown field '{field}' for {record}")]
    UnknownField { field: String, record: &'static str },

    #[error("Invalid value for '{field}': expected {expected}, got {literal}")]
    InvalidLiteral {
        field: String,
        expected: &'static str,
        literal: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Weather error: {0}")]
    Weather(#[from] LookupError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Errors caused by the request itself (the 4xx family).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Syntax(_)
                | Error::UnknownField { .. }
                | Error::InvalidLiteral { .. }
                | Error::InvalidInput(_)
                | Error::PermissionDenied(_)
                | Error::NotFound(_)
                | Error::Conflict(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
