//! Gregorian to Hijri conversion using the arithmetic (tabular) Islamic
//! calendar.
//!
//! The tabular calendar follows a fixed 30-year leap cycle. It agrees with the
//! Umm al-Qura calendar on most days and can differ from it by one day around
//! month starts.

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// `num_days_from_ce` of 1 Muharram AH 1 (19 July 622, proleptic Gregorian)
const EPOCH: i64 = 227_015;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HijriDate {
    pub year: i64,
    pub month: u32,
    pub day: u32,
}

impl fmt::Display for HijriDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl From<NaiveDate> for HijriDate {
    fn from(date: NaiveDate) -> Self {
        let fixed = i64::from(date.num_days_from_ce());
        let year = (30 * (fixed - EPOCH) + 10_646).div_euclid(10_631);
        let prior_days = fixed - fixed_from_hijri(year, 1, 1);
        let month = (11 * prior_days + 330).div_euclid(325);
        let day = fixed - fixed_from_hijri(year, month, 1) + 1;

        Self {
            year,
            month: month as u32,
            day: day as u32,
        }
    }
}

fn fixed_from_hijri(year: i64, month: i64, day: i64) -> i64 {
    EPOCH - 1 + (year - 1) * 354 + (3 + 11 * year).div_euclid(30) + 29 * (month - 1) + month / 2 + day
}
