use chrono::{Datelike, NaiveDate};

/// A single calendar month, the window every monthly aggregation
/// (budgets, dashboard, transaction totals) is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    year: i32,
    month: u32,
    first_day: NaiveDate,
}

impl MonthWindow {
    /// Builds the window for `year`/`month`. Returns `None` when the
    /// month is outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first_day| Self {
            year,
            month,
            first_day,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First day of the month.
    pub fn start(&self) -> NaiveDate {
        self.first_day
    }

    /// Last day of the month.
    pub fn end(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|first_of_next| first_of_next.pred_opt())
            .unwrap_or(self.first_day)
    }

    /// Both bounds inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start() && date <= self.end()
    }
}

/// Steps a date forward by whole months, preserving the day-of-month
/// and clamping to the last day when the target month is shorter
/// (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let zero_based = date.year() as i64 * 12 + date.month0() as i64 + months as i64;
    let year = zero_based.div_euclid(12) as i32;
    let month = zero_based.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, date.day())
        .or_else(|| MonthWindow::new(year, month).map(|w| w.end()))
        .unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window_bounds() {
        let window = MonthWindow::new(2024, 1).unwrap();
        assert_eq!(window.start(), date(2024, 1, 1));
        assert_eq!(window.end(), date(2024, 1, 31));

        let february = MonthWindow::new(2024, 2).unwrap();
        assert_eq!(february.end(), date(2024, 2, 29));

        let december = MonthWindow::new(2023, 12).unwrap();
        assert_eq!(december.end(), date(2023, 12, 31));
    }

    #[test]
    fn test_window_rejects_bad_month() {
        assert!(MonthWindow::new(2024, 0).is_none());
        assert!(MonthWindow::new(2024, 13).is_none());
    }

    #[test]
    fn test_window_contains_is_inclusive() {
        let window = MonthWindow::new(2024, 6).unwrap();
        assert!(window.contains(date(2024, 6, 1)));
        assert!(window.contains(date(2024, 6, 30)));
        assert!(!window.contains(date(2024, 5, 31)));
        assert!(!window.contains(date(2024, 7, 1)));
    }

    #[test]
    fn test_add_months_preserves_day() {
        assert_eq!(add_months(date(2024, 1, 15), 1), date(2024, 2, 15));
        assert_eq!(add_months(date(2024, 1, 15), 2), date(2024, 3, 15));
    }

    #[test]
    fn test_add_months_clamps_to_month_length() {
        assert_eq!(add_months(date(2024, 1, 31), 1), date(2024, 2, 29));
        assert_eq!(add_months(date(2023, 1, 31), 1), date(2023, 2, 28));
        assert_eq!(add_months(date(2024, 3, 31), 1), date(2024, 4, 30));
    }

    #[test]
    fn test_add_months_crosses_year_boundary() {
        assert_eq!(add_months(date(2024, 11, 15), 3), date(2025, 2, 15));
        assert_eq!(add_months(date(2024, 12, 31), 2), date(2025, 2, 28));
    }
}
