use chrono::{DateTime, NaiveDate, Utc};

/// Calendar-day format used as the date key of every dated record.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Today's UTC calendar day, matching the day key stamped on new records.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn day_key(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

pub fn today_key() -> String {
    day_key(today())
}

/// Parse a `YYYY-MM-DD` day key; `None` for anything else.
pub fn parse_day_key(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DAY_FORMAT).ok()
}

pub fn to_date(ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
