//! Local calendar day helpers.
//!
//! Sessions are stored with UTC instants; reports and aggregates are keyed
//! by a calendar date in a configured time zone.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// UTC bounds `[start, end)` of the local calendar day `date` in `tz`.
///
/// DST aware: the day may be 23 or 25 hours long.
#[must_use]
pub fn local_day_bounds(date: NaiveDate, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let next = date.succ_opt().unwrap_or(NaiveDate::MAX);
    (local_midnight(date, tz), local_midnight(next, tz))
}

/// Today's date in `tz`
#[must_use]
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let mut local = date.and_time(NaiveTime::MIN);
    // A few zones skip midnight on DST changes; the day then starts at the
    // first valid local instant.
    for _ in 0..8 {
        if let Some(instant) = tz.from_local_datetime(&local).earliest() {
            return instant.with_timezone(&Utc);
        }
        local += Duration::minutes(30);
    }
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utc_day_bounds() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let (start, end) = local_day_bounds(date, Tz::UTC);

        assert_eq!(start, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_offset_day_bounds() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let (start, end) = local_day_bounds(date, chrono_tz::Asia::Tokyo);

        assert_eq!(start, Utc.with_ymd_and_hms(2024, 4, 30, 15, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap());
    }

    #[test]
    fn test_dst_spring_forward_day_is_23_hours() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let (start, end) = local_day_bounds(date, chrono_tz::America::New_York);

        assert_eq!(end - start, Duration::hours(23));
    }

    #[test]
    fn test_midnight_in_dst_gap() {
        // Santiago skipped 2022-09-11 00:00 -> 01:00
        let date = NaiveDate::from_ymd_opt(2022, 9, 11).unwrap();
        let (start, _) = local_day_bounds(date, chrono_tz::America::Santiago);

        let local = start.with_timezone(&chrono_tz::America::Santiago);
        assert_eq!(local.date_naive(), date);
        assert_eq!(local.time(), NaiveTime::from_hms_opt(1, 0, 0).unwrap());
    }
}
