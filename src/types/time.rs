use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Conversion of the various chrono timestamp flavours into a UTC instant.
///
/// Naive values are interpreted as UTC wall-clock time, which is the convention of every
/// weather table in this crate.
pub trait IntoUtcDateTime {
    fn into_utc(self) -> DateTime<Utc>;
}

impl IntoUtcDateTime for NaiveDateTime {
    fn into_utc(self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self)
    }
}

/// Midnight at the start of the day.
impl IntoUtcDateTime for NaiveDate {
    fn into_utc(self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.and_time(chrono::NaiveTime::MIN))
    }
}

impl IntoUtcDateTime for DateTime<Local> {
    fn into_utc(self) -> DateTime<Utc> {
        self.with_timezone(&Utc)
    }
}

impl IntoUtcDateTime for DateTime<Utc> {
    fn into_utc(self) -> DateTime<Utc> {
        self
    }
}

impl IntoUtcDateTime for DateTime<FixedOffset> {
    fn into_utc(self) -> DateTime<Utc> {
        self.with_timezone(&Utc)
    }
}

/// First and last hour of the UTC calendar day containing `timestamp`.
///
/// Forecast adapters request whole days of hourly values around their target.
pub(crate) fn utc_day_bounds(timestamp: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = timestamp.date_naive().into_utc();
    (start, start + Duration::hours(23))
}
