//! Per-file statistics evaluator
//!
//! Computes one [`StatValue`] per resolved token for a file whose event list
//! is final (observed plus reconstructed).

use crate::context::RunContext;
use crate::library::FileRecord;
use crate::stats::result::{StatResult, StatValue};
use crate::token::{shift, Token, TokenSet, Unit};
use chrono::{Datelike, NaiveDateTime};
use rayon::prelude::*;

/// Compute the value of one token for one file
pub fn evaluate_token(token: &Token, record: &FileRecord, ctx: &RunContext) -> StatValue {
    match token {
        Token::Range(_) | Token::CalendarYear(_) | Token::CalendarMonth(_) | Token::Weekday(_) => {
            let count = record
                .events
                .iter()
                .filter(|t| token.matches_event(t).unwrap_or(false))
                .count();
            StatValue::Count(count as i64)
        }
        Token::Unplayed => StatValue::Count(i64::from(!record.has_plays())),
        Token::PreHistory => StatValue::Count(i64::from(record.prehistory_count)),
        Token::Recent => {
            let since = shift(ctx.now(), -1, Unit::Month).unwrap_or(NaiveDateTime::MIN);
            StatValue::Count(i64::from(record.earliest_play.is_some_and(|t| t >= since)))
        }
        Token::Unpopular => {
            let before = shift(ctx.now(), -1, Unit::Year).unwrap_or(NaiveDateTime::MIN);
            StatValue::Count(i64::from(record.earliest_play.is_some_and(|t| t < before)))
        }
        Token::PerYear { start_year } => {
            let start = start_year.unwrap_or(ctx.earliest_year);
            let series = (start..=ctx.current_year())
                .map(|year| record.events.iter().filter(|t| t.year() == year).count() as i64)
                .collect();
            StatValue::Series(series)
        }
        Token::PerMonth => {
            let mut series = vec![0i64; 12];
            for t in &record.events {
                series[t.month0() as usize] += 1;
            }
            StatValue::Series(series)
        }
        Token::PerWeekday => {
            // Sunday first regardless of the configured week start
            let mut series = vec![0i64; 7];
            for t in &record.events {
                series[t.weekday().num_days_from_sunday() as usize] += 1;
            }
            StatValue::Series(series)
        }
    }
}

/// Compute every token of the set for one file
pub fn evaluate_file(record: &FileRecord, tokens: &TokenSet, ctx: &RunContext) -> StatResult {
    let mut result = StatResult::new();
    for resolved in tokens.iter() {
        result.insert(
            resolved.text.clone(),
            evaluate_token(&resolved.token, record, ctx),
        );
    }
    result
}

/// Attach statistics to every record, in parallel
pub fn evaluate_all(records: &mut [FileRecord], tokens: &TokenSet, ctx: &RunContext) {
    records.par_iter_mut().for_each(|record| {
        record.stats = evaluate_file(record, tokens, ctx);
    });
    tracing::debug!(
        files = records.len(),
        tokens = tokens.len(),
        "Evaluated statistics"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::LibraryFile;
    use crate::token::ResolveContext;
    use chrono::{NaiveDate, Weekday};

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn ctx(week_start: Weekday) -> RunContext {
        let now = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        RunContext::from_reductions(ResolveContext::new(now, week_start), Some(day(2022, 2, 1)))
    }

    fn record(events: Vec<NaiveDateTime>) -> FileRecord {
        FileRecord::new(LibraryFile::new(1, "a").plays(events.len() as u32), events)
    }

    fn eval(text: &str, record: &FileRecord, ctx: &RunContext) -> StatValue {
        let set = TokenSet::build([text], &ctx.resolve).unwrap();
        evaluate_file(record, &set, ctx)
            .get(&crate::token::canonical_text(text))
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_range_window_count() {
        let ctx = ctx(Weekday::Sun);
        let file = record(vec![day(2024, 5, 1), day(2024, 6, 1)]);
        assert_eq!(eval("[today-30d,31d]", &file, &ctx), StatValue::Count(1));
        assert_eq!(eval("[total]", &file, &ctx), StatValue::Count(2));
    }

    #[test]
    fn test_weekday_selector_with_monday_start() {
        let ctx = ctx(Weekday::Mon);
        let file = record(vec![day(2024, 6, 3), day(2024, 6, 5), day(2024, 6, 6)]);
        assert_eq!(eval("[weekday=mon,wed]", &file, &ctx), StatValue::Count(2));
        assert_eq!(eval("[weekday=1,3]", &file, &ctx), StatValue::Count(2));
    }

    #[test]
    fn test_calendar_selectors() {
        let ctx = ctx(Weekday::Sun);
        let file = record(vec![day(2023, 12, 24), day(2024, 12, 1), day(2024, 1, 1)]);
        assert_eq!(eval("[year=2024]", &file, &ctx), StatValue::Count(2));
        assert_eq!(eval("[month=dec]", &file, &ctx), StatValue::Count(2));
        assert_eq!(eval("[weekends]", &file, &ctx), StatValue::Count(2));
    }

    #[test]
    fn test_classification_tokens() {
        let ctx = ctx(Weekday::Sun);
        let empty = record(Vec::new());
        assert_eq!(eval("[unplayed]", &empty, &ctx), StatValue::Count(1));
        assert_eq!(eval("[unpopular]", &empty, &ctx), StatValue::Count(0));
        assert_eq!(eval("[recent]", &empty, &ctx), StatValue::Count(0));
        assert_eq!(eval("[total]", &empty, &ctx), StatValue::Count(0));

        let fresh = record(vec![day(2024, 6, 1)]);
        assert_eq!(eval("[recent]", &fresh, &ctx), StatValue::Count(1));
        assert_eq!(eval("[unplayed]", &fresh, &ctx), StatValue::Count(0));

        // earliest play drives both classifications
        let old = record(vec![day(2022, 1, 1), day(2024, 6, 14)]);
        assert_eq!(eval("[recent]", &old, &ctx), StatValue::Count(0));
        assert_eq!(eval("[unpopular]", &old, &ctx), StatValue::Count(1));
    }

    #[test]
    fn test_prehistory_count() {
        let ctx = ctx(Weekday::Sun);
        let file = FileRecord::new(LibraryFile::new(1, "a").plays(7), vec![day(2024, 1, 1)]);
        assert_eq!(eval("[prehistory]", &file, &ctx), StatValue::Count(6));
    }

    #[test]
    fn test_per_year_series() {
        let ctx = ctx(Weekday::Sun);
        let file = record(vec![day(2022, 3, 1), day(2024, 1, 1), day(2024, 2, 1)]);
        assert_eq!(
            eval("[peryear]", &file, &ctx),
            StatValue::Series(vec![1, 0, 2])
        );
        assert_eq!(
            eval("[peryear=2023]", &file, &ctx),
            StatValue::Series(vec![0, 2])
        );
        assert_eq!(eval("[peryear=2030]", &file, &ctx), StatValue::Series(vec![]));
    }

    #[test]
    fn test_per_month_sums_to_event_count() {
        let ctx = ctx(Weekday::Sun);
        let file = record(vec![day(2022, 3, 1), day(2024, 3, 9), day(2024, 12, 1)]);
        let value = eval("[permonth]", &file, &ctx);
        match value {
            StatValue::Series(series) => {
                assert_eq!(series.len(), 12);
                assert_eq!(series[2], 2);
                assert_eq!(series[11], 1);
                assert_eq!(series.iter().sum::<i64>(), file.events.len() as i64);
            }
            other => panic!("expected series, got {:?}", other),
        }
    }

    #[test]
    fn test_per_weekday_ignores_week_start() {
        // 2024-06-03 is a Monday
        let file = record(vec![day(2024, 6, 3)]);
        for start in [Weekday::Sun, Weekday::Mon, Weekday::Sat] {
            assert_eq!(
                eval("[perweekday]", &file, &ctx(start)),
                StatValue::Series(vec![0, 1, 0, 0, 0, 0, 0])
            );
        }
    }

    #[test]
    fn test_evaluate_all_attaches_results() {
        let ctx = ctx(Weekday::Sun);
        let set = TokenSet::build(["[total]", "[unplayed]"], &ctx.resolve).unwrap();
        let mut records = vec![record(vec![day(2024, 1, 1)]), record(Vec::new())];

        evaluate_all(&mut records, &set, &ctx);

        assert_eq!(records[0].stats.count("total"), 1);
        assert_eq!(records[1].stats.count("unplayed"), 1);
        assert_eq!(records[1].stats.len(), 2);
    }
}
