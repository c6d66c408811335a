//! Calendar fields derived from registry date strings

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, Utc};
use serde_json::{json, Value};
use tracing::warn;

/// A calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthYear {
    pub month: u32,
    pub year: i32,
}

impl MonthYear {
    pub fn new(month: u32, year: i32) -> Self {
        Self { month, year }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::new(date.month(), date.year())
    }

    /// The month the process is running in, local time
    pub fn current() -> Self {
        Self::of(Local::now().date_naive())
    }

    pub fn to_value(self) -> Value {
        json!({ "month": self.month, "year": self.year })
    }

    /// Inverse of [`MonthYear::to_value`]
    pub fn from_value(value: &Value) -> Option<Self> {
        let month = value.get("month")?.as_u64()?;
        let year = value.get("year")?.as_i64()?;
        Some(Self::new(u32::try_from(month).ok()?, i32::try_from(year).ok()?))
    }
}

/// Parse an EDGAR date (`2024-03-02`), also accepting full timestamps.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Date held by a document field.
///
/// Missing and non-string values yield `None` quietly; a string that is
/// not a date also yields `None` but is logged, since it points at bad data.
pub fn date_field(value: Option<&Value>, field: &str) -> Option<NaiveDate> {
    let text = value?.as_str()?;
    let date = parse_date(text);
    if date.is_none() {
        warn!(field, value = text, "Unparseable date; row skipped");
    }
    date
}
