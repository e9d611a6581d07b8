//! Business-day deadline arithmetic.
//!
//! A business day is any calendar day other than Saturday or Sunday. Holidays
//! are not modelled.

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};

/// Whether `weekday` counts as a business day.
#[must_use]
pub const fn is_business_day(weekday: Weekday) -> bool {
    !matches!(weekday, Weekday::Sat | Weekday::Sun)
}

/// Advance `start` by `days` business days, keeping the time of day.
///
/// Each step moves one calendar day forward and only counts it when it lands
/// on a weekday, so Friday + 3 is the following Wednesday and Monday + 3 is
/// Thursday. `days == 0` returns `start` unchanged.
#[must_use]
pub fn add_business_days(start: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    let mut current = start;
    let mut remaining = days;
    while remaining > 0 {
        current += Duration::days(1);
        if is_business_day(current.weekday()) {
            remaining -= 1;
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).single().expect("valid date")
    }

    #[test]
    fn friday_plus_three_is_wednesday() {
        // 2024-03-01 is a Friday.
        let deadline = add_business_days(at(2024, 3, 1), 3);
        assert_eq!(deadline, at(2024, 3, 6));
        assert_eq!(deadline.weekday(), Weekday::Wed);
    }

    #[test]
    fn monday_plus_three_is_thursday() {
        let deadline = add_business_days(at(2024, 3, 4), 3);
        assert_eq!(deadline, at(2024, 3, 7));
        assert_eq!(deadline.weekday(), Weekday::Thu);
    }

    #[test]
    fn weekend_start_counts_from_monday() {
        // Saturday + 1 lands on Monday; Sunday + 1 as well.
        assert_eq!(add_business_days(at(2024, 3, 2), 1), at(2024, 3, 4));
        assert_eq!(add_business_days(at(2024, 3, 3), 1), at(2024, 3, 4));
    }

    #[test]
    fn zero_days_is_identity() {
        let start = at(2024, 3, 2);
        assert_eq!(add_business_days(start, 0), start);
    }

    #[test]
    fn crosses_month_boundary() {
        // Thursday 2024-02-29 + 2 = Monday 2024-03-04.
        assert_eq!(add_business_days(at(2024, 2, 29), 2), at(2024, 3, 4));
    }

    proptest! {
        #[test]
        fn deadline_never_lands_on_weekend(offset in 0i64..3650, days in 1u32..40) {
            let start = at(2020, 1, 1) + Duration::days(offset);
            let deadline = add_business_days(start, days);
            prop_assert!(is_business_day(deadline.weekday()));
        }

        #[test]
        fn five_business_days_is_one_week_from_a_weekday(offset in 0i64..3650) {
            let start = at(2020, 1, 1) + Duration::days(offset);
            prop_assume!(is_business_day(start.weekday()));
            prop_assert_eq!(add_business_days(start, 5), start + Duration::days(7));
        }
    }
}
