//! Token Parser
//!
//! Parses template token text into a [`TokenExpr`]. Parsing is purely
//! syntactic; calendar arithmetic and range checks happen when the expression
//! is resolved (see [`crate::token::window`]).
//!
//! # Supported Syntax
//!
//! ```text
//! now|today|week|month|year [(+|-)N[h|d|w|m|y]] [,N[h|d|w|m|y]]
//! date=yyyy-mm-dd[HH:MM] [,N[h|d|w|m|y]]
//! year=N[,N...]
//! month=N[,N...]      month=jan[,feb...]
//! weekday=N[,N...]    weekday=mon[,tuesday...]
//! total | weekend(s) | recent | unpopular | unplayed | prehistory
//! peryear[=N] | permonth | perweekday
//! ```
//!
//! Input is case and whitespace insensitive; surrounding brackets are optional.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while_m_n},
    character::complete::{alpha1, char, digit1, one_of},
    combinator::{all_consuming, map, map_opt, map_res, opt, recognize, value},
    multi::separated_list1,
    sequence::{pair, preceded, separated_pair, tuple},
    IResult,
};

use crate::token::ast::*;
use crate::token::error::{TokenError, TokenResult};
use chrono::Weekday;

/// Canonical form of a token: brackets stripped, lowercase, no whitespace
pub fn canonical_text(text: &str) -> String {
    text.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Parse token text into an unresolved expression
pub fn parse_token(text: &str) -> TokenResult<TokenExpr> {
    let canonical = canonical_text(text);
    if canonical.is_empty() {
        return Err(TokenError::Empty);
    }

    let result = alt((
        all_consuming(parse_relative),
        all_consuming(parse_date),
        all_consuming(parse_selector),
        all_consuming(parse_keyword),
    ))(canonical.as_str());

    match result {
        Ok((_, expr)) => Ok(expr),
        Err(_) => Err(TokenError::Unknown(canonical)),
    }
}

/// Parse a relative range like "today-30d,31d"
fn parse_relative(input: &str) -> IResult<&str, TokenExpr> {
    let (input, anchor) = parse_anchor(input)?;
    let (input, shift) = opt(parse_shift)(input)?;
    let (input, length) = opt(parse_length)(input)?;

    Ok((
        input,
        TokenExpr::Relative {
            anchor,
            shift,
            length,
        },
    ))
}

fn parse_anchor(input: &str) -> IResult<&str, Anchor> {
    alt((
        value(Anchor::Now, tag("now")),
        value(Anchor::Today, tag("today")),
        value(Anchor::Week, tag("week")),
        value(Anchor::Month, tag("month")),
        value(Anchor::Year, tag("year")),
    ))(input)
}

/// Parse a signed shift like "-30d" or "+2"
fn parse_shift(input: &str) -> IResult<&str, Amount> {
    let (input, value) = map_res(recognize(pair(one_of("+-"), digit1)), |s: &str| {
        s.parse::<i64>()
    })(input)?;
    let (input, unit) = opt(parse_unit)(input)?;
    Ok((input, Amount::new(value, unit)))
}

/// Parse a window length like ",31d"
fn parse_length(input: &str) -> IResult<&str, Amount> {
    let (input, _) = char(',')(input)?;
    let (input, value) = parse_integer(input)?;
    let (input, unit) = opt(parse_unit)(input)?;
    Ok((input, Amount::new(value, unit)))
}

fn parse_unit(input: &str) -> IResult<&str, Unit> {
    map_opt(one_of("hdwmy"), Unit::from_char)(input)
}

/// Parse an absolute range like "date=2024-06-0110:30,2h"
fn parse_date(input: &str) -> IResult<&str, TokenExpr> {
    let (input, _) = tag("date=")(input)?;
    let (input, (year, _, month, _, day)) = tuple((
        four_digits,
        char('-'),
        two_digits,
        char('-'),
        two_digits,
    ))(input)?;
    let (input, time) = opt(preceded(
        opt(char('t')),
        separated_pair(two_digits, char(':'), two_digits),
    ))(input)?;
    let (input, length) = opt(parse_length)(input)?;

    Ok((
        input,
        TokenExpr::Date {
            year: year as i32,
            month,
            day,
            time,
            length,
        },
    ))
}

fn four_digits(input: &str) -> IResult<&str, u32> {
    map_res(take_while_m_n(4, 4, |c: char| c.is_ascii_digit()), |s: &str| {
        s.parse::<u32>()
    })(input)
}

fn two_digits(input: &str) -> IResult<&str, u32> {
    map_res(take_while_m_n(2, 2, |c: char| c.is_ascii_digit()), |s: &str| {
        s.parse::<u32>()
    })(input)
}

/// Parse a calendar selector like "weekday=mon,wed" or "year=2023"
fn parse_selector(input: &str) -> IResult<&str, TokenExpr> {
    alt((
        map(preceded(tag("year="), integer_list), TokenExpr::Years),
        map(
            preceded(
                tag("month="),
                alt((
                    integer_list,
                    separated_list1(char(','), map_opt(alpha1, month_from_name)),
                )),
            ),
            TokenExpr::Months,
        ),
        map(
            preceded(
                tag("weekday="),
                alt((
                    map(integer_list, WeekdayList::Numeric),
                    map(
                        separated_list1(char(','), map_opt(alpha1, weekday_from_name)),
                        WeekdayList::Named,
                    ),
                )),
            ),
            TokenExpr::Weekdays,
        ),
    ))(input)
}

fn integer_list(input: &str) -> IResult<&str, Vec<i64>> {
    separated_list1(char(','), parse_integer)(input)
}

fn parse_integer(input: &str) -> IResult<&str, i64> {
    map_res(digit1, |s: &str| s.parse::<i64>())(input)
}

/// Map a weekday name (abbreviated or full) to a weekday
pub fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name {
        "sun" | "sunday" => Some(Weekday::Sun),
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        _ => None,
    }
}

/// Map a month name (abbreviated or full) to its number
pub fn month_from_name(name: &str) -> Option<i64> {
    let month = match name {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(month)
}

/// Parse a fixed keyword with its optional value
fn parse_keyword(input: &str) -> IResult<&str, TokenExpr> {
    let (input, word) = alt((
        value(Keyword::Total, tag("total")),
        value(Keyword::Weekend, tag("weekends")),
        value(Keyword::Weekend, tag("weekend")),
        value(Keyword::Recent, tag("recent")),
        value(Keyword::Unpopular, tag("unpopular")),
        value(Keyword::Unplayed, tag("unplayed")),
        value(Keyword::PreHistory, tag("prehistory")),
        value(Keyword::PerYear, tag("peryear")),
        value(Keyword::PerMonth, tag("permonth")),
        value(Keyword::PerWeekday, tag("perweekday")),
    ))(input)?;
    let (input, value) = opt(preceded(one_of(",="), parse_integer))(input)?;

    Ok((input, TokenExpr::Keyword { word, value }))
}
