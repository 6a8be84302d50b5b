//! Business-day bucketing
//!
//! Reporting groups by calendar date with a 06:00 cutoff: anything rung up
//! before 06:00 belongs to the previous day's trade.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};

/// Timestamps before this hour roll back to the previous calendar date
pub const CUTOFF_HOUR: u32 = 6;

/// The business day a timestamp falls on
pub fn business_date(ts: DateTime<Utc>) -> NaiveDate {
    if ts.hour() < CUTOFF_HOUR {
        ts.date_naive() - Duration::days(1)
    } else {
        ts.date_naive()
    }
}

/// The half-open window `[start, end)` covering the business day before the
/// one `now` falls on. Used by the daily report to select "yesterday's"
/// bills.
pub fn prior_business_day_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = business_date(now);
    let yesterday = today - Duration::days(1);
    (day_start(yesterday), day_start(today))
}

/// 06:00 on the given calendar date, the instant a business day opens
fn day_start(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(CUTOFF_HOUR, 0, 0).expect("valid time"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn early_morning_rolls_back_a_day() {
        assert_eq!(
            business_date(ts("2024-03-02T05:30:00Z")),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }

    #[test]
    fn after_cutoff_stays_on_the_same_date() {
        assert_eq!(
            business_date(ts("2024-03-02T06:01:00Z")),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
    }

    #[test]
    fn cutoff_itself_opens_the_new_day() {
        assert_eq!(
            business_date(ts("2024-03-02T06:00:00Z")),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
    }

    #[test]
    fn prior_window_spans_cutoff_to_cutoff() {
        let (start, end) = prior_business_day_window(ts("2024-03-02T14:00:00Z"));
        assert_eq!(start, ts("2024-03-01T06:00:00Z"));
        assert_eq!(end, ts("2024-03-02T06:00:00Z"));
    }

    #[test]
    fn prior_window_before_cutoff_shifts_back_too() {
        // 03:00 on the 2nd is still business day the 1st, so "yesterday"
        // is Feb 29.
        let (start, end) = prior_business_day_window(ts("2024-03-02T03:00:00Z"));
        assert_eq!(start, ts("2024-02-29T06:00:00Z"));
        assert_eq!(end, ts("2024-03-01T06:00:00Z"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Shifting a timestamp by whole days shifts its business day
            /// by the same number of days.
            #[test]
            fn shift_by_days_shifts_bucket(secs in 0i64..86_400, days in 0i64..3_650) {
                let base = ts("2020-01-01T00:00:00Z") + Duration::seconds(secs);
                let shifted = base + Duration::days(days);
                prop_assert_eq!(
                    business_date(shifted),
                    business_date(base) + Duration::days(days)
                );
            }

            /// Every timestamp lands on either its own date or the one before.
            #[test]
            fn bucket_is_today_or_yesterday(secs in 0i64..86_400) {
                let t = ts("2024-06-15T00:00:00Z") + Duration::seconds(secs);
                let bucket = business_date(t);
                let date = t.date_naive();
                prop_assert!(bucket == date || bucket == date - Duration::days(1));
            }
        }
    }
}
