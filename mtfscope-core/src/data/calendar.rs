//! Trading calendar: which dates are sessions, and their hours.
//!
//! `NyseCalendar` models weekdays minus the NYSE full-day holidays. Early
//! closes and one-off closures are not modelled; every session runs the
//! configured open/close.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use std::collections::BTreeSet;

pub trait TradingCalendar: Send + Sync {
    /// True if the exchange holds a regular session on `date`.
    fn is_session(&self, date: NaiveDate) -> bool;

    /// Regular-session open and close, exchange-local.
    fn market_hours(&self, date: NaiveDate) -> (NaiveTime, NaiveTime);

    /// All sessions in `[start, end]`. Empty when `start > end`.
    fn valid_sessions(&self, start: NaiveDate, end: NaiveDate) -> BTreeSet<NaiveDate> {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| self.is_session(*d))
            .collect()
    }

    /// The `count` most recent sessions on or before `end`, ascending.
    fn previous_sessions(&self, end: NaiveDate, count: usize) -> Vec<NaiveDate> {
        let mut sessions: Vec<NaiveDate> = std::iter::successors(Some(end), |d| d.pred_opt())
            .filter(|d| self.is_session(*d))
            .take(count)
            .collect();
        sessions.reverse();
        sessions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NyseCalendar {
    open: NaiveTime,
    close: NaiveTime,
}

impl NyseCalendar {
    pub fn new(open: NaiveTime, close: NaiveTime) -> Self {
        Self { open, close }
    }

    /// Observed full-day holidays for `year`.
    pub fn holidays(year: i32) -> BTreeSet<NaiveDate> {
        let mut days = BTreeSet::new();

        // New Year's Day on a Saturday is not moved to the prior Friday.
        if let Some(jan1) = NaiveDate::from_ymd_opt(year, 1, 1) {
            match jan1.weekday() {
                Weekday::Sat => {}
                Weekday::Sun => {
                    days.insert(jan1 + Duration::days(1));
                }
                _ => {
                    days.insert(jan1);
                }
            }
        }

        days.extend(nth_weekday(year, 1, Weekday::Mon, 3));
        days.extend(nth_weekday(year, 2, Weekday::Mon, 3));
        days.extend(easter_sunday(year).map(|e| e - Duration::days(2)));
        days.extend(last_weekday(year, 5, Weekday::Mon));
        if year >= 2022 {
            days.extend(NaiveDate::from_ymd_opt(year, 6, 19).map(observed));
        }
        days.extend(NaiveDate::from_ymd_opt(year, 7, 4).map(observed));
        days.extend(nth_weekday(year, 9, Weekday::Mon, 1));
        days.extend(nth_weekday(year, 11, Weekday::Thu, 4));
        days.extend(NaiveDate::from_ymd_opt(year, 12, 25).map(observed));

        days
    }

    pub fn is_holiday(date: NaiveDate) -> bool {
        Self::holidays(date.year()).contains(&date)
    }
}

impl Default for NyseCalendar {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl TradingCalendar for NyseCalendar {
    fn is_session(&self, date: NaiveDate) -> bool {
        !is_weekend(date) && !Self::is_holiday(date)
    }

    fn market_hours(&self, _date: NaiveDate) -> (NaiveTime, NaiveTime) {
        (self.open, self.close)
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Saturday holidays move to Friday, Sunday holidays to Monday.
fn observed(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    nth_weekday(year, month, weekday, 5).or_else(|| nth_weekday(year, month, weekday, 4))
}

/// Gregorian Easter Sunday (anonymous computus).
fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn easter_dates() {
        assert_eq!(easter_sunday(2024), Some(d(2024, 3, 31)));
        assert_eq!(easter_sunday(2025), Some(d(2025, 4, 20)));
        assert_eq!(easter_sunday(2019), Some(d(2019, 4, 21)));
    }

    #[test]
    fn holidays_2024() {
        let h = NyseCalendar::holidays(2024);
        let expected = [
            d(2024, 1, 1),
            d(2024, 1, 15),
            d(2024, 2, 19),
            d(2024, 3, 29),
            d(2024, 5, 27),
            d(2024, 6, 19),
            d(2024, 7, 4),
            d(2024, 9, 2),
            d(2024, 11, 28),
            d(2024, 12, 25),
        ];
        assert_eq!(h, expected.into_iter().collect());
    }

    #[test]
    fn observance_rules() {
        // 2021-07-04 is a Sunday: observed Monday the 5th.
        assert!(NyseCalendar::is_holiday(d(2021, 7, 5)));
        // 2021-12-25 is a Saturday: observed Friday the 24th.
        assert!(NyseCalendar::is_holiday(d(2021, 12, 24)));
        // 2022-01-01 is a Saturday: no observed holiday on 2021-12-31.
        assert!(!NyseCalendar::is_holiday(d(2021, 12, 31)));
        // 2023-01-01 is a Sunday: observed Monday the 2nd.
        assert!(NyseCalendar::is_holiday(d(2023, 1, 2)));
        // Juneteenth only from 2022.
        assert!(!NyseCalendar::is_holiday(d(2021, 6, 18)));
        assert!(NyseCalendar::is_holiday(d(2022, 6, 20)));
    }

    #[test]
    fn valid_sessions_skip_weekends_and_holidays() {
        let cal = NyseCalendar::default();
        let sessions = cal.valid_sessions(d(2024, 3, 27), d(2024, 4, 2));
        let expected: BTreeSet<_> = [d(2024, 3, 27), d(2024, 3, 28), d(2024, 4, 1), d(2024, 4, 2)]
            .into_iter()
            .collect();
        assert_eq!(sessions, expected);
        assert!(cal.valid_sessions(d(2024, 4, 2), d(2024, 4, 1)).is_empty());
    }

    #[test]
    fn previous_sessions_are_ascending() {
        let cal = NyseCalendar::default();
        let prev = cal.previous_sessions(d(2024, 7, 8), 3);
        assert_eq!(prev, vec![d(2024, 7, 3), d(2024, 7, 5), d(2024, 7, 8)]);
    }

    #[test]
    fn default_hours() {
        let (open, close) = NyseCalendar::default().market_hours(d(2024, 3, 4));
        assert_eq!(open, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(close, NaiveTime::from_hms_opt(16, 0, 0).unwrap());
    }
}
