use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// An ISO-8601 week, tagged with the ISO year it belongs to. Late-December
/// and early-January days can sit in a week of the neighbouring year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "WeekParts")]
pub struct WeekKey {
    year: i32,
    week: u32,
}

#[derive(Deserialize)]
struct WeekParts {
    year: i32,
    week: u32,
}

impl TryFrom<WeekParts> for WeekKey {
    type Error = LedgerError;

    fn try_from(parts: WeekParts) -> Result<Self> {
        Self::new(parts.year, parts.week)
    }
}

impl WeekKey {
    pub fn new(year: i32, week: u32) -> Result<Self> {
        if NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).is_none() {
            return Err(LedgerError::validation(format!(
                "week {week} does not exist in ISO year {year}"
            )));
        }
        Ok(Self { year, week })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    pub fn containing(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    pub fn monday(&self) -> NaiveDate {
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon)
            .unwrap_or(NaiveDate::MIN)
    }

    /// Working week bounds, Monday through Saturday.
    pub fn bounds(&self) -> (NaiveDate, NaiveDate) {
        let monday = self.monday();
        (monday, monday + Duration::days(5))
    }

    /// Calendar months whose overlap set contains this week, Sunday included.
    pub fn months(&self) -> Vec<MonthKey> {
        let monday = self.monday();
        let mut months = vec![MonthKey::containing(monday)];
        let last = MonthKey::containing(monday + Duration::days(6));
        if last != months[0] {
            months.push(last);
        }
        months
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "MonthParts")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

#[derive(Deserialize)]
struct MonthParts {
    year: i32,
    month: u32,
}

impl TryFrom<MonthParts> for MonthKey {
    type Error = LedgerError;

    fn try_from(parts: MonthParts) -> Result<Self> {
        Self::new(parts.year, parts.month)
    }
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(LedgerError::validation(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|next| next - Duration::days(1))
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn quarter(&self) -> u32 {
        (self.month - 1) / 3 + 1
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Every ISO week touched by a day of the given month. Boundary weeks keep
/// their own ISO year, so January 2027 yields 2026-W53 alongside 2027-W01.
pub fn weeks_overlapping_month(year: i32, month: u32) -> Result<BTreeSet<WeekKey>> {
    let key = MonthKey::new(year, month)?;
    let last = key.last_day();
    Ok(key
        .first_day()
        .iter_days()
        .take_while(|day| *day <= last)
        .map(WeekKey::containing)
        .collect())
}

pub fn quarter_of(month: u32) -> Result<u32> {
    Ok(MonthKey::new(2000, month)?.quarter())
}

pub fn months_in_quarter(quarter: u32) -> Result<[u32; 3]> {
    if !(1..=4).contains(&quarter) {
        return Err(LedgerError::validation(format!(
            "quarter must be between 1 and 4, got {quarter}"
        )));
    }
    let first = (quarter - 1) * 3 + 1;
    Ok([first, first + 1, first + 2])
}

/// The "current" week, month and quarter for a reference date. Callers
/// derive it once per request and pass the pieces into the rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReferencePeriod {
    pub date: NaiveDate,
    pub week: WeekKey,
    pub month: MonthKey,
    pub quarter: u32,
}

impl ReferencePeriod {
    pub fn of(date: NaiveDate) -> Self {
        let month = MonthKey::containing(date);
        Self {
            date,
            week: WeekKey::containing(date),
            month,
            quarter: month.quarter(),
        }
    }
}
