//! Run-wide context
//!
//! Everything a run fixes up front (the reference instant, the week start) and
//! the two batch-wide reductions computed after all histories are parsed.

use crate::token::ResolveContext;
use chrono::{Datelike, NaiveDateTime};

/// Oldest year the per-year series may start from
pub const EARLIEST_SERIES_YEAR: i32 = 2000;

/// Immutable context threaded through evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    pub resolve: ResolveContext,
    /// Oldest observed play across the batch; pre-history stays before it
    pub history_floor: NaiveDateTime,
    /// Year of the oldest observed play, floored at 2000
    pub earliest_year: i32,
}

impl RunContext {
    /// Build the context from the reductions over all observed events
    ///
    /// With no observed events anywhere, the floor is `now` and the earliest
    /// year is the current year.
    pub fn from_reductions(resolve: ResolveContext, earliest: Option<NaiveDateTime>) -> Self {
        let history_floor = earliest.unwrap_or(resolve.now);
        let earliest_year = history_floor.year().max(EARLIEST_SERIES_YEAR);
        Self {
            resolve,
            history_floor,
            earliest_year,
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.resolve.now
    }

    pub fn current_year(&self) -> i32 {
        self.resolve.now.year()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Weekday};

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_reductions() {
        let resolve = ResolveContext::new(day(2024, 6, 15), Weekday::Sun);

        let ctx = RunContext::from_reductions(resolve, Some(day(2019, 3, 1)));
        assert_eq!(ctx.history_floor, day(2019, 3, 1));
        assert_eq!(ctx.earliest_year, 2019);

        let ctx = RunContext::from_reductions(resolve, Some(day(1998, 3, 1)));
        assert_eq!(ctx.earliest_year, 2000);

        let ctx = RunContext::from_reductions(resolve, None);
        assert_eq!(ctx.history_floor, day(2024, 6, 15));
        assert_eq!(ctx.earliest_year, 2024);
        assert_eq!(ctx.current_year(), 2024);
    }
}
