//! Field values as seen by search predicates.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, TimeDelta};

use crate::search::Literal;
use crate::{Error, Result};

/// A record field read for comparison.
///
/// Text borrows from the record; everything else is `Copy`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Id(u64),
    Float(f64),
    Text(&'a str),
    Date(NaiveDate),
    Duration(TimeDelta),
}

// ============================================================================
// Type checking
// ============================================================================

impl FieldValue<'_> {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Id(_) => "ID",
            FieldValue::Float(_) => "FLOAT",
            FieldValue::Text(_) => "TEXT",
            FieldValue::Date(_) => "DATE",
            FieldValue::Duration(_) => "DURATION",
        }
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Id(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Date(d) => write!(f, "{d}"),
            FieldValue::Duration(d) => f.write_str(&format_duration(*d)),
        }
    }
}

// ============================================================================
// Comparison against search literals
// ============================================================================

impl FieldValue<'_> {
    /// Compare this field value with a literal, coercing the literal to the
    /// field's type first.
    ///
    /// `Ok(None)` means the values are unordered (NaN). A literal that cannot
    /// be read as the field's type is an [`Error::InvalidLiteral`].
    pub fn compare(&self, field: &str, literal: &Literal) -> Result<Option<Ordering>> {
        let invalid = || Error::InvalidLiteral {
            field: field.to_string(),
            expected: self.type_name(),
            literal: literal.to_string(),
        };

        match (self, literal) {
            (FieldValue::Float(a), Literal::Number(b)) => Ok(a.partial_cmp(b)),
            (FieldValue::Float(a), Literal::Text(s) | Literal::Date(s) | Literal::Time(s)) => {
                let b = parse_decimal(s).ok_or_else(invalid)?;
                Ok(a.partial_cmp(&b))
            }

            (FieldValue::Id(a), Literal::Number(b)) if b.fract() == 0.0 => {
                Ok((*a as f64).partial_cmp(b))
            }
            (FieldValue::Id(a), Literal::Text(s)) => {
                let b = whole(s.trim()).ok_or_else(invalid)?;
                Ok(Some(a.cmp(&b)))
            }
            (FieldValue::Id(_), _) => Err(invalid()),

            // Numbers compare by their decimal text, e.g. `23.0`.
            (FieldValue::Text(a), Literal::Number(b)) => Ok(Some((*a).cmp(format!("{b:?}").as_str()))),
            (FieldValue::Text(a), Literal::Text(s) | Literal::Date(s) | Literal::Time(s)) => {
                Ok(Some((*a).cmp(s.as_str())))
            }

            (FieldValue::Date(a), Literal::Text(s) | Literal::Date(s)) => {
                let b = parse_date(s).ok_or_else(invalid)?;
                Ok(Some(a.cmp(&b)))
            }
            (FieldValue::Date(_), _) => Err(invalid()),

            (FieldValue::Duration(a), Literal::Number(secs)) => {
                let b = duration_from_secs(*secs).ok_or_else(invalid)?;
                Ok(Some(a.cmp(&b)))
            }
            (FieldValue::Duration(a), Literal::Text(s) | Literal::Time(s)) => {
                let b = parse_duration(s).ok_or_else(invalid)?;
                Ok(Some(a.cmp(&b)))
            }
            (FieldValue::Duration(_), _) => Err(invalid()),
        }
    }
}

fn parse_decimal(s: &str) -> Option<f64> {
    let s = s.trim();
    let digits = !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit() || b == b'.');
    digits.then(|| s.parse().ok()).flatten()
}

/// Parse `YYYY-M-D` (month and day may be one or two digits).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

// ============================================================================
// Durations
// ============================================================================

/// Seconds (possibly fractional) as a duration, to microsecond precision.
pub fn duration_from_secs(secs: f64) -> Option<TimeDelta> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(TimeDelta::microseconds((secs * 1_000_000.0).round() as i64))
}

/// Parse `[D ][[H:]M:]S[.fraction]`.
///
/// Two clock parts read as minutes and seconds (`58:24`), three as hours,
/// minutes and seconds (`1:22:47`).
pub fn parse_duration(text: &str) -> Option<TimeDelta> {
    let text = text.trim();
    let (days, clock) = match text.split_once(' ') {
        Some((days, clock)) => (whole(days)?, clock.trim()),
        None => (0, text),
    };
    let parts: Vec<&str> = clock.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [s] => (0, 0, *s),
        [m, s] => (0, whole(m)?, *s),
        [h, m, s] => (whole(h)?, whole(m)?, *s),
        _ => return None,
    };
    let seconds = parse_decimal(seconds)?;
    let total = days as f64 * 86_400.0 + hours as f64 * 3_600.0 + minutes as f64 * 60.0 + seconds;
    duration_from_secs(total)
}

fn whole(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Render as `[D ]HH:MM:SS[.ffffff]`.
pub fn format_duration(d: TimeDelta) -> String {
    let sign = if d < TimeDelta::zero() { "-" } else { "" };
    let d = d.abs();
    let secs = d.num_seconds();
    let micros = d.subsec_nanos() / 1_000;
    let (days, h, m, s) = (secs / 86_400, secs % 86_400 / 3_600, secs % 3_600 / 60, secs % 60);

    let mut out = if days > 0 {
        format!("{sign}{days} {h:02}:{m:02}:{s:02}")
    } else {
        format!("{sign}{h:02}:{m:02}:{s:02}")
    };
    if micros > 0 {
        out.push_str(&format!(".{micros:06}"));
    }
    out
}

/// Serde adapter: durations travel as `HH:MM:SS` text, and may also be
/// given as a number of seconds.
pub mod serde_duration {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(f64),
        Text(String),
    }

    impl Raw {
        fn into_duration<E: serde::de::Error>(self) -> Result<TimeDelta, E> {
            match self {
                Raw::Seconds(secs) => super::duration_from_secs(secs)
                    .ok_or_else(|| E::custom(format!("invalid duration: {secs} seconds"))),
                Raw::Text(text) => super::parse_duration(&text)
                    .ok_or_else(|| E::custom(format!("invalid duration '{text}'"))),
            }
        }
    }

    pub fn serialize<S: Serializer>(d: &TimeDelta, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_duration(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<TimeDelta, D::Error> {
        Raw::deserialize(d)?.into_duration()
    }

    pub fn deserialize_opt<'de, D: Deserializer<'de>>(d: D) -> Result<Option<TimeDelta>, D::Error> {
        match Option::<Raw>::deserialize(d)? {
            Some(raw) => raw.into_duration().map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_forms() {
        assert_eq!(parse_duration("58:24"), Some(TimeDelta::seconds(3504)));
        assert_eq!(parse_duration("1:22:47"), Some(TimeDelta::seconds(4967)));
        assert_eq!(parse_duration("00:58:24"), Some(TimeDelta::seconds(3504)));
        assert_eq!(parse_duration("11:23:23.3"), Some(TimeDelta::milliseconds(41_003_300)));
        assert_eq!(parse_duration("1 02:00:00"), Some(TimeDelta::hours(26)));
        assert_eq!(parse_duration("45"), Some(TimeDelta::seconds(45)));
        assert_eq!(parse_duration("1:2:3:4"), None);
        assert_eq!(parse_duration("a:10"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(TimeDelta::seconds(3504)), "00:58:24");
        assert_eq!(format_duration(TimeDelta::seconds(4967)), "01:22:47");
        assert_eq!(format_duration(TimeDelta::hours(26)), "1 02:00:00");
        assert_eq!(format_duration(TimeDelta::milliseconds(1_500)), "00:00:01.500000");
    }

    #[test]
    fn test_numeric_comparison() {
        let v = FieldValue::Float(11.3);
        assert_eq!(v.compare("distance", &Literal::Number(12.0)).unwrap(), Some(Ordering::Less));
        assert_eq!(v.compare("distance", &Literal::Text("11.3".into())).unwrap(), Some(Ordering::Equal));
        assert!(v.compare("distance", &Literal::Text("far".into())).is_err());
    }

    #[test]
    fn test_text_against_number() {
        let v = FieldValue::Text("23.0");
        assert_eq!(v.compare("location", &Literal::Number(23.0)).unwrap(), Some(Ordering::Equal));
    }

    #[test]
    fn test_id_requires_whole_number() {
        let v = FieldValue::Id(3);
        assert_eq!(v.compare("id", &Literal::Number(3.0)).unwrap(), Some(Ordering::Equal));
        assert!(v.compare("id", &Literal::Number(3.5)).is_err());
        assert!(v.compare("owner", &Literal::Text("bob".into())).is_err());
        assert!(v.compare("owner", &Literal::Text("3.0".into())).is_err());
        assert_eq!(v.compare("owner", &Literal::Text("3".into())).unwrap(), Some(Ordering::Equal));
        assert_eq!(v.compare("owner", &Literal::Text(" 12 ".into())).unwrap(), Some(Ordering::Less));
    }

    #[test]
    fn test_digit_only_text_matches_text_fields() {
        let v = FieldValue::Text("12345");
        assert_eq!(v.compare("username", &Literal::Text("12345".into())).unwrap(), Some(Ordering::Equal));
    }

    #[test]
    fn test_duration_against_clock_text() {
        let v = FieldValue::Duration(TimeDelta::seconds(3504));
        for text in ["58:24", "00:58:24", "3504"] {
            assert_eq!(v.compare("time", &Literal::Text(text.into())).unwrap(), Some(Ordering::Equal));
        }
        assert!(v.compare("time", &Literal::Text("an hour".into())).is_err());
    }

    #[test]
    fn test_duration_against_number_is_seconds() {
        let v = FieldValue::Duration(TimeDelta::seconds(11));
        assert_eq!(v.compare("time", &Literal::Number(11.0)).unwrap(), Some(Ordering::Equal));
        assert_eq!(
            v.compare("time", &Literal::Time("11:23".into())).unwrap(),
            Some(Ordering::Less)
        );
    }
}
