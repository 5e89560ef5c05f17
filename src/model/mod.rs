//! # Record Model
//!
//! DTOs that cross every boundary: storage ↔ search ↔ tracker ↔ caller.
//! Pure data: no I/O, no state, no async.

pub mod record;
pub mod report;
pub mod run;
pub mod user;
pub mod value;

pub use record::Record;
pub use report::{ReportId, WeeklyReport};
pub use run::{NewRun, Run, RunId, RunPatch, UNKNOWN_WEATHER};
pub use user::{Role, User, UserId};
pub use value::FieldValue;
