use crate::model::AttendanceStatus;
use chrono::{Datelike, NaiveDate, Weekday};

/// Half-away-from-zero rounding to two decimals.
pub fn round_2_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// `present / total * 100` rounded to two decimals, 0 when `total` is 0.
pub fn percentage(present: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_2_decimals(present as f64 / total as f64 * 100.0)
}

pub fn mean_percentage(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    round_2_decimals(values.iter().sum::<f64>() / values.len() as f64)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub present: u32,
    pub absent: u32,
    pub late: u32,
}

impl StatusCounts {
    pub fn tally<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = AttendanceStatus>,
    {
        let mut out = StatusCounts::default();
        for s in statuses {
            out.add(s);
        }
        out
    }

    pub fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Late => self.late += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.present + self.absent + self.late
    }

    /// Share of present rows among the tallied rows.
    pub fn percentage(&self) -> f64 {
        percentage(self.present, self.total())
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => 30,
    }
}

/// Monday..=Friday dates between the first and last day of the month.
pub fn weekdays_in_month(year: i32, month: u32) -> u32 {
    (1..=days_in_month(year, month))
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .count() as u32
}

/// Inclusive `(first, last)` calendar dates of a month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))?;
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_to_two_decimals() {
        assert_eq!(percentage(1, 2), 50.0);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(4, 5), 80.0);
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(7, 7), 100.0);
    }

    #[test]
    fn mean_percentage_of_empty_is_zero() {
        assert_eq!(mean_percentage(&[]), 0.0);
        assert_eq!(mean_percentage(&[80.0, 60.0, 33.33]), 57.78);
    }

    #[test]
    fn tally_counts_each_status() {
        let c = StatusCounts::tally([
            AttendanceStatus::Present,
            AttendanceStatus::Late,
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
        ]);
        assert_eq!(c.present, 2);
        assert_eq!(c.absent, 1);
        assert_eq!(c.late, 1);
        assert_eq!(c.total(), 4);
        assert_eq!(c.percentage(), 50.0);
    }

    #[test]
    fn weekday_counts_match_calendar() {
        // March 2024 starts on a Friday: 21 weekdays.
        assert_eq!(weekdays_in_month(2024, 3), 21);
        // February 2024 (leap): 21 weekdays.
        assert_eq!(weekdays_in_month(2024, 2), 21);
        // February 2021 starts on a Monday: exactly 20.
        assert_eq!(weekdays_in_month(2021, 2), 20);
        // June 2024 starts on a Saturday: 20 weekdays.
        assert_eq!(weekdays_in_month(2024, 6), 20);
    }

    #[test]
    fn month_bounds_cover_leap_february() {
        let (first, last) = month_bounds(2024, 2).expect("bounds");
        assert_eq!(first.to_string(), "2024-02-01");
        assert_eq!(last.to_string(), "2024-02-29");
        assert!(month_bounds(2024, 13).is_none());
    }
}
