//! Point-in-time values parsed from the names of `time` nodes.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Datetime layouts tried in order after RFC 3339 / RFC 2822.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%B %d, %Y %I:%M %p",
    "%b %d, %Y %I:%M %p",
    "%B %d, %Y at %I:%M %p",
    "%b %d, %Y at %I:%M %p",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
];

/// Date-only layouts; the time of day defaults to midnight.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%m/%d/%Y",
    "%A, %B %d, %Y",
    "%a, %b %d, %Y",
];

/// A parsed calendar instant exposing its fields by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeValue {
    datetime: NaiveDateTime,
}

impl TimeValue {
    /// Parse free text into a time value. Returns `None` instead of failing.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
            return Some(Self::from(parsed.naive_local()));
        }
        if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
            return Some(Self::from(parsed.naive_local()));
        }
        for format in DATETIME_FORMATS {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
                return Some(Self::from(parsed));
            }
        }
        for format in DATE_FORMATS {
            if let Ok(parsed) = NaiveDate::parse_from_str(text, format) {
                return Some(Self::from(parsed.and_time(NaiveTime::MIN)));
            }
        }
        None
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.datetime
    }

    /// Look up a calendar field (`year`, `month`, `day`, `hour`, `minute`,
    /// `second`, `weekday`). Weekday counts from Monday = 0.
    pub fn field(&self, key: &str) -> Option<i64> {
        let value = match key {
            "year" => i64::from(self.datetime.year()),
            "month" => i64::from(self.datetime.month()),
            "day" => i64::from(self.datetime.day()),
            "hour" => i64::from(self.datetime.hour()),
            "minute" => i64::from(self.datetime.minute()),
            "second" => i64::from(self.datetime.second()),
            "weekday" => i64::from(self.datetime.weekday().num_days_from_monday()),
            _ => return None,
        };
        Some(value)
    }
}

impl From<NaiveDateTime> for TimeValue {
    fn from(datetime: NaiveDateTime) -> Self {
        Self { datetime }
    }
}
