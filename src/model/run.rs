//! Logged runs.

use std::fmt;

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use super::value::serde_duration;
use super::{FieldValue, Record, UserId};
use crate::{Error, Result};

/// Weather text stored when no provider could describe the day.
pub const UNKNOWN_WEATHER: &str = "?";

/// Opaque run identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One run, owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run {
    pub id: RunId,
    pub date: NaiveDate,
    /// Kilometres.
    pub distance: f64,
    #[serde(with = "serde_duration")]
    pub time: TimeDelta,
    pub location: String,
    #[serde(rename = "user")]
    pub owner: UserId,
    pub weather: String,
}

impl Record for Run {
    const NAME: &'static str = "run";
    const FIELDS: &'static [&'static str] =
        &["id", "date", "distance", "time", "location", "owner", "weather"];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::Id(self.id.0)),
            "date" => Some(FieldValue::Date(self.date)),
            "distance" => Some(FieldValue::Float(self.distance)),
            "time" => Some(FieldValue::Duration(self.time)),
            "location" => Some(FieldValue::Text(&self.location)),
            "owner" => Some(FieldValue::Id(self.owner.0)),
            "weather" => Some(FieldValue::Text(&self.weather)),
            _ => None,
        }
    }
}

/// The user-supplied part of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRun {
    pub date: NaiveDate,
    pub distance: f64,
    #[serde(with = "serde_duration")]
    pub time: TimeDelta,
    pub location: String,
}

impl NewRun {
    pub fn new(date: NaiveDate, distance: f64, time: TimeDelta, location: impl Into<String>) -> Self {
        Self { date, distance, time, location: location.into() }
    }

    pub fn validate(&self) -> Result<()> {
        validate_date(self.date)?;
        validate_distance(self.distance)?;
        validate_time(self.time)?;
        validate_location(&self.location)
    }
}

/// A partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunPatch {
    pub date: Option<NaiveDate>,
    pub distance: Option<f64>,
    #[serde(deserialize_with = "serde_duration::deserialize_opt")]
    pub time: Option<TimeDelta>,
    pub location: Option<String>,
}

impl RunPatch {
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }

    pub fn time(mut self, time: TimeDelta) -> Self {
        self.time = Some(time);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(d) = self.date {
            validate_date(d)?;
        }
        if let Some(d) = self.distance {
            validate_distance(d)?;
        }
        if let Some(t) = self.time {
            validate_time(t)?;
        }
        if let Some(l) = &self.location {
            validate_location(l)?;
        }
        Ok(())
    }

    /// The run as it looks after applying this patch.
    pub fn apply(&self, run: &Run) -> NewRun {
        NewRun {
            date: self.date.unwrap_or(run.date),
            distance: self.distance.unwrap_or(run.distance),
            time: self.time.unwrap_or(run.time),
            location: self.location.clone().unwrap_or_else(|| run.location.clone()),
        }
    }
}

impl From<NewRun> for RunPatch {
    fn from(run: NewRun) -> Self {
        RunPatch {
            date: Some(run.date),
            distance: Some(run.distance),
            time: Some(run.time),
            location: Some(run.location),
        }
    }
}

/// The whole Monday..Sunday week must be representable.
fn validate_date(date: NaiveDate) -> Result<()> {
    crate::stats::week_bounds(date).map(|_| ())
}

fn validate_distance(distance: f64) -> Result<()> {
    if !distance.is_finite() || distance < 0.0 {
        return Err(Error::InvalidInput(format!("distance must be a non-negative number, got {distance}")));
    }
    Ok(())
}

fn validate_time(time: TimeDelta) -> Result<()> {
    if time <= TimeDelta::zero() {
        return Err(Error::InvalidInput("time must be positive".into()));
    }
    Ok(())
}

fn validate_location(location: &str) -> Result<()> {
    if location.trim().is_empty() {
        return Err(Error::InvalidInput("location must not be empty".into()));
    }
    Ok(())
}
