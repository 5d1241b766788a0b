//! Playlist definitions
//!
//! A per-year definition (`[peryear]` or `[peryear=<start>]`) expands into
//! one concrete playlist per calendar year, each ordered by a one-year
//! absolute range token.

use crate::token::{canonical_text, parse_token, Keyword, TokenExpr, TokenResult};
use regex::Regex;
use std::sync::OnceLock;

/// Default playlist size
pub const DEFAULT_LIST_SIZE: usize = 100;

/// A concrete playlist definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistDef {
    pub name: String,
    /// Canonical text of the ordering token
    pub token: String,
    /// Maximum size; zero means unbounded
    pub max: usize,
}

impl PlaylistDef {
    pub fn new(name: impl Into<String>, token: &str, max: usize) -> Self {
        Self {
            name: name.into(),
            token: canonical_text(token),
            max,
        }
    }
}

fn year_placeholder() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\[\s*year\s*\]").expect("year pattern is valid"))
}

/// Name of the playlist for one year
pub fn year_name(pattern: &str, year: i32) -> String {
    if year_placeholder().is_match(pattern) {
        year_placeholder()
            .replace_all(pattern, year.to_string().as_str())
            .into_owned()
    } else {
        format!("{pattern} ({year})")
    }
}

/// Expand a configured playlist into concrete definitions
///
/// Per-year playlists start at the token's year, else `yearly_base`, and run
/// through `current_year`. Every other token yields a single definition.
pub fn expand_definition(
    name: &str,
    token: &str,
    max: usize,
    yearly_base: i32,
    current_year: i32,
) -> TokenResult<Vec<PlaylistDef>> {
    let expr = parse_token(token)?;

    let TokenExpr::Keyword {
        word: Keyword::PerYear,
        value,
    } = expr
    else {
        return Ok(vec![PlaylistDef::new(name, token, max)]);
    };

    let start = value.map_or(yearly_base, |v| v as i32);
    let defs = (start..=current_year)
        .map(|year| PlaylistDef {
            name: year_name(name, year),
            token: format!("date={year:04}-01-01,1y"),
            max,
        })
        .collect::<Vec<_>>();

    tracing::debug!(playlist = name, count = defs.len(), "Expanded per-year playlist");
    Ok(defs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_name() {
        assert_eq!(year_name("Top of [Year]", 2023), "Top of 2023");
        assert_eq!(year_name("Top", 2023), "Top (2023)");
    }

    #[test]
    fn test_expand_per_year_from_token() {
        let defs = expand_definition("Best [year]", "[peryear=2022]", 50, 2020, 2024).unwrap();
        assert_eq!(defs.len(), 3);
        assert_eq!(defs[0].name, "Best 2022");
        assert_eq!(defs[0].token, "date=2022-01-01,1y");
        assert_eq!(defs[2].name, "Best 2024");
        assert!(defs.iter().all(|d| d.max == 50));
    }

    #[test]
    fn test_expand_per_year_from_base() {
        let defs = expand_definition("Yearly", "[PerYear]", 100, 2023, 2024).unwrap();
        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Yearly (2023)", "Yearly (2024)"]);
    }

    #[test]
    fn test_expand_pads_short_years() {
        let defs = expand_definition("Old", "[peryear]", 10, 999, 1000).unwrap();
        assert_eq!(defs[0].token, "date=0999-01-01,1y");
        assert_eq!(defs[1].token, "date=1000-01-01,1y");
    }

    #[test]
    fn test_expand_plain_definition() {
        let defs = expand_definition("Recent", "[ Recent ]", 10, 2020, 2024).unwrap();
        assert_eq!(defs, vec![PlaylistDef::new("Recent", "recent", 10)]);
    }

    #[test]
    fn test_expand_invalid_token() {
        assert!(expand_definition("Bad", "[nope]", 10, 2020, 2024).is_err());
    }
}
