//! Time Window Resolver
//!
//! Turns a [`TokenExpr`] into a [`Token`] against one reference instant and
//! one configured first day of the week. The reference instant is captured
//! once per run so every file sees the same windows.

use crate::token::ast::*;
use crate::token::error::{TokenError, TokenResult};
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// Lowest year accepted by year selectors
pub const MIN_YEAR: i64 = 2000;
/// Highest year accepted by year selectors
pub const MAX_YEAR: i64 = 2100;

/// Half-open time window: [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    /// Start (inclusive)
    pub start: NaiveDateTime,
    /// End (exclusive)
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// Create a window, returning None if it would be empty
    pub fn try_new(start: NaiveDateTime, end: NaiveDateTime) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Window matching every representable instant
    pub fn unbounded() -> Self {
        Self {
            start: NaiveDateTime::MIN,
            end: NaiveDateTime::MAX,
        }
    }

    /// Check if a timestamp falls within this window
    pub fn contains(&self, t: &NaiveDateTime) -> bool {
        *t >= self.start && *t < self.end
    }
}

/// Run-fixed inputs needed to resolve tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveContext {
    /// Reference instant
    pub now: NaiveDateTime,
    /// First day of the week
    pub week_start: Weekday,
}

impl ResolveContext {
    pub fn new(now: NaiveDateTime, week_start: Weekday) -> Self {
        Self { now, week_start }
    }

    /// Start instant of an anchor
    pub fn anchor_start(&self, anchor: Anchor) -> NaiveDateTime {
        let today = self.now.date();
        let date = match anchor {
            Anchor::Now => return self.now,
            Anchor::Today => today,
            Anchor::Week => {
                let offset = (today.weekday().num_days_from_sunday() + 7
                    - self.week_start.num_days_from_sunday())
                    % 7;
                today - Duration::days(offset as i64)
            }
            Anchor::Month => today.with_day(1).unwrap_or(today),
            Anchor::Year => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
        };
        date.and_time(NaiveTime::MIN)
    }
}

/// Move an instant by a signed number of calendar units
///
/// Month and year arithmetic clamps the day to the end of the target month.
/// Returns None on overflow.
pub fn shift(instant: NaiveDateTime, amount: i64, unit: Unit) -> Option<NaiveDateTime> {
    if amount == 0 {
        return Some(instant);
    }

    match unit {
        Unit::Hour => instant.checked_add_signed(Duration::try_hours(amount)?),
        Unit::Day => instant.checked_add_signed(Duration::try_days(amount)?),
        Unit::Week => instant.checked_add_signed(Duration::try_weeks(amount)?),
        Unit::Month => shift_months(instant, amount),
        Unit::Year => shift_months(instant, amount.checked_mul(12)?),
    }
}

fn shift_months(instant: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let count = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        instant.checked_add_months(count)
    } else {
        instant.checked_sub_months(count)
    }
}

impl TokenExpr {
    /// Resolve this expression into a token
    ///
    /// `text` is the canonical token text, used for error reporting.
    pub fn resolve(&self, text: &str, ctx: &ResolveContext) -> TokenResult<Token> {
        match self {
            Self::Relative {
                anchor,
                shift: offset,
                length,
            } => {
                let unit = anchor.default_unit();
                let base = ctx.anchor_start(*anchor);
                let start = match offset {
                    Some(a) => shift(base, a.value, a.unit.unwrap_or(unit)),
                    None => Some(base),
                }
                .ok_or_else(|| TokenError::InvalidWindow(text.to_string()))?;

                window_from(text, start, *length, unit).map(Token::Range)
            }

            Self::Date {
                year,
                month,
                day,
                time,
                length,
            } => {
                let date = NaiveDate::from_ymd_opt(*year, *month, *day).ok_or_else(|| {
                    TokenError::OutOfRange {
                        token: text.to_string(),
                        reason: format!("no such date {:04}-{:02}-{:02}", year, month, day),
                    }
                })?;
                let (hour, minute) = time.unwrap_or((0, 0));
                let start = date.and_hms_opt(hour, minute, 0).ok_or_else(|| {
                    TokenError::OutOfRange {
                        token: text.to_string(),
                        reason: format!("no such time {:02}:{:02}", hour, minute),
                    }
                })?;

                window_from(text, start, *length, Unit::Day).map(Token::Range)
            }

            Self::Years(years) => {
                check_range(text, years, MIN_YEAR, MAX_YEAR, "year")?;
                Ok(Token::CalendarYear(
                    years.iter().map(|y| *y as i32).collect(),
                ))
            }

            Self::Months(months) => {
                check_range(text, months, 1, 12, "month")?;
                Ok(Token::CalendarMonth(
                    months.iter().map(|m| *m as u32).collect(),
                ))
            }

            Self::Weekdays(WeekdayList::Numeric(days)) => {
                check_range(text, days, 1, 7, "weekday")?;
                let start = ctx.week_start.num_days_from_sunday();
                Ok(Token::Weekday(WeekdaySet::from_native(
                    days.iter().map(|d| (*d as u32 - 1 + start) % 7),
                )))
            }

            Self::Weekdays(WeekdayList::Named(days)) => Ok(Token::Weekday(
                WeekdaySet::from_native(days.iter().map(|d| d.num_days_from_sunday())),
            )),

            Self::Keyword { word, value } => resolve_keyword(text, *word, *value),
        }
    }
}

fn window_from(
    text: &str,
    start: NaiveDateTime,
    length: Option<Amount>,
    default_unit: Unit,
) -> TokenResult<TimeWindow> {
    let length = length.unwrap_or(Amount::new(1, None));
    if length.value == 0 {
        return Err(TokenError::InvalidWindow(text.to_string()));
    }

    shift(start, length.value, length.unit.unwrap_or(default_unit))
        .and_then(|end| TimeWindow::try_new(start, end))
        .ok_or_else(|| TokenError::InvalidWindow(text.to_string()))
}

fn check_range(text: &str, values: &[i64], min: i64, max: i64, what: &str) -> TokenResult<()> {
    match values.iter().find(|v| **v < min || **v > max) {
        Some(bad) => Err(TokenError::OutOfRange {
            token: text.to_string(),
            reason: format!("{} {} outside {}..={}", what, bad, min, max),
        }),
        None => Ok(()),
    }
}

fn resolve_keyword(text: &str, word: Keyword, value: Option<i64>) -> TokenResult<Token> {
    if value.is_some() && word != Keyword::PerYear {
        return Err(TokenError::UnexpectedValue(text.to_string()));
    }

    Ok(match word {
        Keyword::Total => Token::Range(TimeWindow::unbounded()),
        Keyword::Weekend => Token::Weekday(WeekdaySet::from_native([
            Weekday::Sat.num_days_from_sunday(),
            Weekday::Sun.num_days_from_sunday(),
        ])),
        Keyword::Recent => Token::Recent,
        Keyword::Unpopular => Token::Unpopular,
        Keyword::Unplayed => Token::Unplayed,
        Keyword::PreHistory => Token::PreHistory,
        Keyword::PerMonth => Token::PerMonth,
        Keyword::PerWeekday => Token::PerWeekday,
        Keyword::PerYear => {
            if let Some(year) = value {
                check_range(text, &[year], MIN_YEAR, MAX_YEAR, "year")?;
            }
            Token::PerYear {
                start_year: value.map(|y| y as i32),
            }
        }
    })
}
