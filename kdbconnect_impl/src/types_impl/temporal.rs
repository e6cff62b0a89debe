//! q epoch (2000-01-01) <-> `time` crate conversions (§3, §4.C/§4.M).

use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

const NANOS_PER_SEC: i64 = 1_000_000_000;
const NANOS_PER_MILLI: i64 = 1_000_000;
const MILLIS_PER_SEC: i64 = 1_000;

fn q_epoch_date() -> Date {
    Date::from_calendar_date(2000, Month::January, 1).expect("2000-01-01 is a valid date")
}

fn q_epoch_datetime() -> PrimitiveDateTime {
    PrimitiveDateTime::new(q_epoch_date(), Time::MIDNIGHT)
}

/// Nanoseconds since the q epoch -> a UTC timestamp.
#[must_use]
pub fn timestamp_to_datetime(nanos: i64) -> OffsetDateTime {
    q_epoch_datetime().assume_utc() + time::Duration::nanoseconds(nanos)
}

/// A UTC timestamp -> nanoseconds since the q epoch.
#[must_use]
pub fn datetime_to_timestamp(dt: OffsetDateTime) -> i64 {
    (dt - q_epoch_datetime().assume_utc()).whole_nanoseconds() as i64
}

/// Days since the q epoch -> a calendar date.
#[must_use]
pub fn date_to_python(days: i32) -> Date {
    q_epoch_date() + time::Duration::days(i64::from(days))
}

/// A calendar date -> days since the q epoch.
#[must_use]
pub fn python_to_date(d: Date) -> i32 {
    (d - q_epoch_date()).whole_days() as i32
}

/// Months since 2000-01 -> the first day of that month.
#[must_use]
pub fn month_to_python(months: i32) -> Date {
    let year = 2000 + months.div_euclid(12);
    let month = 1 + months.rem_euclid(12);
    Date::from_calendar_date(year, Month::try_from(month as u8).expect("1..=12"), 1)
        .expect("valid y/m/1")
}

/// A calendar date -> months since 2000-01.
#[must_use]
pub fn python_to_month(d: Date) -> i32 {
    (d.year() - 2000) * 12 + (d.month() as i32 - 1)
}

/// Fractional days since the q epoch -> a UTC timestamp.
#[must_use]
pub fn datetime_to_python(frac_days: f64) -> OffsetDateTime {
    q_epoch_datetime().assume_utc() + time::Duration::seconds_f64(frac_days * 86_400.0)
}

/// A UTC timestamp -> fractional days since the q epoch.
#[must_use]
pub fn python_to_datetime(dt: OffsetDateTime) -> f64 {
    (dt - q_epoch_datetime().assume_utc()).as_seconds_f64() / 86_400.0
}

/// Nanoseconds since midnight -> a duration.
#[must_use]
pub fn timespan_to_timedelta(nanos: i64) -> time::Duration {
    time::Duration::nanoseconds(nanos)
}

/// A duration -> nanoseconds since midnight.
#[must_use]
pub fn timedelta_to_timespan(d: time::Duration) -> i64 {
    d.whole_nanoseconds() as i64
}

/// Minutes since midnight -> a time of day.
#[must_use]
pub fn minute_to_time(minutes: i32) -> Time {
    let (h, m) = (minutes / 60, minutes % 60);
    Time::from_hms(h as u8, m as u8, 0).expect("0..=23, 0..=59")
}

/// A time of day -> minutes since midnight.
#[must_use]
pub fn time_to_minute(t: Time) -> i32 {
    i32::from(t.hour()) * 60 + i32::from(t.minute())
}

/// Seconds since midnight -> a time of day.
#[must_use]
pub fn second_to_time(seconds: i32) -> Time {
    let (h, rem) = (seconds / 3600, seconds % 3600);
    let (m, s) = (rem / 60, rem % 60);
    Time::from_hms(h as u8, m as u8, s as u8).expect("0..=23, 0..=59, 0..=59")
}

/// A time of day -> seconds since midnight.
#[must_use]
pub fn time_to_second(t: Time) -> i32 {
    i32::from(t.hour()) * 3600 + i32::from(t.minute()) * 60 + i32::from(t.second())
}

/// Milliseconds since midnight -> a time of day (microsecond precision).
#[must_use]
pub fn time_to_python(millis: i32) -> Time {
    let secs = millis / MILLIS_PER_SEC as i32;
    let ms = millis % MILLIS_PER_SEC as i32;
    let (h, rem) = (secs / 3600, secs % 3600);
    let (m, s) = (rem / 60, rem % 60);
    Time::from_hms_micro(h as u8, m as u8, s as u8, (ms * 1000) as u32)
        .expect("0..=23, 0..=59, 0..=59, 0..=999999")
}

/// A time of day -> milliseconds since midnight.
#[must_use]
pub fn python_to_time(t: Time) -> i32 {
    (i32::from(t.hour()) * 3600 + i32::from(t.minute()) * 60 + i32::from(t.second())) * 1000
        + t.microsecond() as i32 / 1000
}

#[allow(dead_code)]
const _NANOS_PER_MILLI_UNUSED_CHECK: i64 = NANOS_PER_MILLI;
#[allow(dead_code)]
const _NANOS_PER_SEC_UNUSED_CHECK: i64 = NANOS_PER_SEC;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_round_trips() {
        let d = Date::from_calendar_date(2024, Month::March, 15).unwrap();
        assert_eq!(date_to_python(python_to_date(d)), d);
    }

    #[test]
    fn month_round_trips() {
        let d = Date::from_calendar_date(2024, Month::March, 1).unwrap();
        assert_eq!(month_to_python(python_to_month(d)), d);
    }

    #[test]
    fn time_round_trips() {
        let t = Time::from_hms(13, 45, 7).unwrap();
        assert_eq!(second_to_time(time_to_second(t)), t);
    }

    #[test]
    fn timestamp_round_trips() {
        let dt = q_epoch_datetime().assume_utc() + time::Duration::days(100);
        assert_eq!(timestamp_to_datetime(datetime_to_timestamp(dt)), dt);
    }
}
