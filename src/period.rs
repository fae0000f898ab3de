use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// A calendar month. The common time index every dataset kind normalizes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// `month` must be in 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Period> {
        if (1..=12).contains(&month) {
            Some(Period { year, month })
        } else {
            None
        }
    }

    pub fn from_date(date: NaiveDate) -> Period {
        Period {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Months since year 0, a comparable ordinal across year boundaries.
    pub fn ordinal(&self) -> i32 {
        self.year * 12 + self.month as i32 - 1
    }

    pub fn prev_month(&self) -> Period {
        if self.month == 1 {
            Period {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Period {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Same calendar month, one year earlier. The YoY alignment rule.
    pub fn prev_year(&self) -> Period {
        Period {
            year: self.year - 1,
            month: self.month,
        }
    }

    /// Sortable key, e.g. "2025-06".
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Human label, e.g. "Jun 2025".
    pub fn label(&self) -> String {
        format!("{} {}", month_abbrev(self.month), self.year)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

fn month_abbrev(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        12 => "Dec",
        _ => "???",
    }
}

/// An inclusive month range. Single months are what calculators emit;
/// wider spans come out of year rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PeriodSpan {
    pub start: Period,
    pub end: Period,
}

impl PeriodSpan {
    pub fn new(start: Period, end: Period) -> PeriodSpan {
        if start <= end {
            PeriodSpan { start, end }
        } else {
            PeriodSpan {
                start: end,
                end: start,
            }
        }
    }

    pub fn month(period: Period) -> PeriodSpan {
        PeriodSpan {
            start: period,
            end: period,
        }
    }

    pub fn is_single_month(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, period: Period) -> bool {
        self.start <= period && period <= self.end
    }

    /// Widen to include `period`.
    pub fn extend(&mut self, period: Period) {
        if period < self.start {
            self.start = period;
        }
        if period > self.end {
            self.end = period;
        }
    }

    pub fn label(&self) -> String {
        if self.is_single_month() {
            self.start.label()
        } else {
            format!("{} to {}", self.start.label(), self.end.label())
        }
    }
}

impl fmt::Display for PeriodSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_month() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}..{}", self.start, self.end)
        }
    }
}
