//! Weekly reports: one per user and calendar week.

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::{FieldValue, Record, UserId};

/// Opaque report identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub u64);

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Aggregated distance and speed for one Monday–Sunday week.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyReport {
    pub id: ReportId,
    pub owner: UserId,
    /// Always a Monday.
    pub week_start: NaiveDate,
    pub total_distance_km: f64,
    pub average_speed_kmph: f64,
}

impl WeeklyReport {
    pub fn week_end(&self) -> NaiveDate {
        self.week_start.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX)
    }

    /// `"2020-10-05 to 2020-10-11"`
    pub fn week(&self) -> String {
        format!("{} to {}", self.week_start, self.week_end())
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl Serialize for WeeklyReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("WeeklyReport", 5)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("week", &self.week())?;
        s.serialize_field("week_start", &self.week_start)?;
        s.serialize_field("total_distance_km", &round2(self.total_distance_km))?;
        s.serialize_field("average_speed_kmph", &round2(self.average_speed_kmph))?;
        s.end()
    }
}

impl Record for WeeklyReport {
    const NAME: &'static str = "weekly report";
    const FIELDS: &'static [&'static str] =
        &["id", "week_start", "total_distance_km", "average_speed_kmph", "owner"];

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::Id(self.id.0)),
            "week_start" => Some(FieldValue::Date(self.week_start)),
            "total_distance_km" => Some(FieldValue::Float(self.total_distance_km)),
            "average_speed_kmph" => Some(FieldValue::Float(self.average_speed_kmph)),
            "owner" => Some(FieldValue::Id(self.owner.0)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let report = WeeklyReport {
            id: ReportId(1),
            owner: UserId(1),
            week_start: NaiveDate::from_ymd_opt(2020, 10, 5).unwrap(),
            total_distance_km: 59.0,
            average_speed_kmph: 59.0 * 3600.0 / 18046.0,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["week"], "2020-10-05 to 2020-10-11");
        assert_eq!(json["total_distance_km"], 59.0);
        assert_eq!(json["average_speed_kmph"], 11.77);
    }
}
