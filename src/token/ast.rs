//! Token Abstract Syntax Tree
//!
//! Two layers describe a template token:
//!
//! - [`TokenExpr`]: the syntax as written, before any calendar arithmetic.
//! - [`Token`]: the resolved descriptor, one variant per token kind, each
//!   carrying only the data its kind needs.
//!
//! # Example Tokens
//!
//! ```text
//! [today-30d,31d]     [week]          [month-1]
//! [weekday=mon,wed]   [month=12]      [year=2023,2024]
//! [date=2024-06-01,2w]                [total]
//! [peryear=2015]      [permonth]      [unplayed]
//! ```

use crate::token::window::TimeWindow;
use chrono::{Datelike, NaiveDateTime, Weekday};
use std::collections::BTreeSet;

/// Starting point of a relative range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// The reference instant itself
    Now,
    /// Midnight of the reference day
    Today,
    /// Midnight of the first day of the current week
    Week,
    /// First day of the current month
    Month,
    /// January 1st of the current year
    Year,
}

impl Anchor {
    /// Unit used for shifts and lengths that omit one
    pub fn default_unit(&self) -> Unit {
        match self {
            Self::Now => Unit::Hour,
            Self::Today => Unit::Day,
            Self::Week => Unit::Week,
            Self::Month => Unit::Month,
            Self::Year => Unit::Year,
        }
    }
}

impl std::fmt::Display for Anchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Now => write!(f, "now"),
            Self::Today => write!(f, "today"),
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
            Self::Year => write!(f, "year"),
        }
    }
}

/// Calendar unit of a shift or window length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Unit {
    /// Parse from the single-letter suffix
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'h' => Some(Self::Hour),
            'd' => Some(Self::Day),
            'w' => Some(Self::Week),
            'm' => Some(Self::Month),
            'y' => Some(Self::Year),
            _ => None,
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hour => write!(f, "h"),
            Self::Day => write!(f, "d"),
            Self::Week => write!(f, "w"),
            Self::Month => write!(f, "m"),
            Self::Year => write!(f, "y"),
        }
    }
}

/// A count of units, with the unit left open when the text omits it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount {
    pub value: i64,
    pub unit: Option<Unit>,
}

impl Amount {
    pub fn new(value: i64, unit: Option<Unit>) -> Self {
        Self { value, unit }
    }
}

/// Weekday selector values as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeekdayList {
    /// 1-based positions relative to the configured week start
    Numeric(Vec<i64>),
    /// Day names
    Named(Vec<Weekday>),
}

/// Fixed keyword tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Total,
    Weekend,
    Recent,
    Unpopular,
    Unplayed,
    PreHistory,
    PerYear,
    PerMonth,
    PerWeekday,
}

/// Unresolved token syntax
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenExpr {
    /// `<anchor>[±N<unit>][,N<unit>]`
    Relative {
        anchor: Anchor,
        shift: Option<Amount>,
        length: Option<Amount>,
    },
    /// `date=yyyy-mm-dd[HH:MM][,N<unit>]`
    Date {
        year: i32,
        month: u32,
        day: u32,
        time: Option<(u32, u32)>,
        length: Option<Amount>,
    },
    /// `year=n,...`
    Years(Vec<i64>),
    /// `month=n,...` or `month=name,...` (names already mapped to 1..12)
    Months(Vec<i64>),
    /// `weekday=...`
    Weekdays(WeekdayList),
    /// Fixed keyword with its optional `=N` value
    Keyword { word: Keyword, value: Option<i64> },
}

/// Set of weekdays, stored in native numbering (Sunday = 0)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WeekdaySet {
    days: BTreeSet<u32>,
}

impl WeekdaySet {
    /// Build from native indices (Sunday = 0)
    pub fn from_native(days: impl IntoIterator<Item = u32>) -> Self {
        Self {
            days: days.into_iter().map(|d| d % 7).collect(),
        }
    }

    /// Check membership of a weekday
    pub fn contains(&self, day: Weekday) -> bool {
        self.days.contains(&day.num_days_from_sunday())
    }

}

/// Kind of a resolved token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Range,
    CalendarYear,
    CalendarMonth,
    Weekday,
    PerYear,
    PerMonth,
    PerWeekday,
    Recent,
    Unpopular,
    Unplayed,
    PreHistory,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Range => write!(f, "range"),
            Self::CalendarYear => write!(f, "year"),
            Self::CalendarMonth => write!(f, "month"),
            Self::Weekday => write!(f, "weekday"),
            Self::PerYear => write!(f, "peryear"),
            Self::PerMonth => write!(f, "permonth"),
            Self::PerWeekday => write!(f, "perweekday"),
            Self::Recent => write!(f, "recent"),
            Self::Unpopular => write!(f, "unpopular"),
            Self::Unplayed => write!(f, "unplayed"),
            Self::PreHistory => write!(f, "prehistory"),
        }
    }
}

/// A resolved token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Events inside a half-open window
    Range(TimeWindow),
    /// Events in any of the listed years
    CalendarYear(BTreeSet<i32>),
    /// Events in any of the listed months (1..12), any year
    CalendarMonth(BTreeSet<u32>),
    /// Events on any of the listed weekdays
    Weekday(WeekdaySet),
    /// Per-year series; `None` starts at the run-wide earliest play year
    PerYear { start_year: Option<i32> },
    /// Twelve-entry per-month series
    PerMonth,
    /// Seven-entry per-weekday series, Sunday first
    PerWeekday,
    Recent,
    Unpopular,
    Unplayed,
    PreHistory,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Self::Range(_) => TokenKind::Range,
            Self::CalendarYear(_) => TokenKind::CalendarYear,
            Self::CalendarMonth(_) => TokenKind::CalendarMonth,
            Self::Weekday(_) => TokenKind::Weekday,
            Self::PerYear { .. } => TokenKind::PerYear,
            Self::PerMonth => TokenKind::PerMonth,
            Self::PerWeekday => TokenKind::PerWeekday,
            Self::Recent => TokenKind::Recent,
            Self::Unpopular => TokenKind::Unpopular,
            Self::Unplayed => TokenKind::Unplayed,
            Self::PreHistory => TokenKind::PreHistory,
        }
    }

    /// Whether this token renders as a series rather than a single count
    pub fn is_series(&self) -> bool {
        matches!(self, Self::PerYear { .. } | Self::PerMonth | Self::PerWeekday)
    }

    /// Event predicate for the counting kinds
    ///
    /// Returns `None` for kinds that are not a per-event predicate.
    pub fn matches_event(&self, t: &NaiveDateTime) -> Option<bool> {
        match self {
            Self::Range(window) => Some(window.contains(t)),
            Self::CalendarYear(years) => Some(years.contains(&t.year())),
            Self::CalendarMonth(months) => Some(months.contains(&t.month())),
            Self::Weekday(days) => Some(days.contains(t.weekday())),
            _ => None,
        }
    }
}

/// A resolved token together with its canonical text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    /// Canonical text: lowercase, no brackets, no whitespace
    pub text: String,
    pub token: Token,
}

impl ResolvedToken {
    pub fn kind(&self) -> TokenKind {
        self.token.kind()
    }
}
