//! Token Registry
//!
//! Collects every token referenced by a run's templates and playlists,
//! resolves each distinct canonical text exactly once, and reports all
//! invalid tokens together.

use crate::token::ast::{ResolvedToken, Token};
use crate::token::error::{TokenError, TokenResult};
use crate::token::parser::{canonical_text, parse_token};
use crate::token::window::ResolveContext;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Pattern matching one bracketed token in a template
pub fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[([^\[\]]*)\]").expect("token pattern is valid"))
}

/// Canonical text of every `[...]` occurrence in a template, in order
pub fn extract_tokens(template: &str) -> Vec<String> {
    token_pattern()
        .captures_iter(template)
        .map(|caps| canonical_text(&caps[1]))
        .collect()
}

/// Parse and resolve a single token
pub fn resolve_token(text: &str, ctx: &ResolveContext) -> TokenResult<ResolvedToken> {
    let canonical = canonical_text(text);
    let token = parse_token(&canonical)?.resolve(&canonical, ctx)?;
    Ok(ResolvedToken {
        text: canonical,
        token,
    })
}

/// De-duplicated set of resolved tokens, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct TokenSet {
    tokens: Vec<ResolvedToken>,
    by_text: HashMap<String, usize>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every distinct token text
    ///
    /// Fails with [`TokenError::Invalid`] listing every invalid token.
    pub fn build<I, S>(texts: I, ctx: &ResolveContext) -> TokenResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        let mut errors = Vec::new();
        let mut rejected = std::collections::HashSet::new();

        for text in texts {
            let canonical = canonical_text(text.as_ref());
            if set.by_text.contains_key(&canonical) || rejected.contains(&canonical) {
                continue;
            }

            match resolve_token(&canonical, ctx) {
                Ok(resolved) => set.insert(resolved),
                Err(e) => {
                    tracing::debug!(token = %canonical, error = %e, "invalid token");
                    rejected.insert(canonical);
                    errors.push(e);
                }
            }
        }

        if errors.is_empty() {
            Ok(set)
        } else {
            Err(TokenError::Invalid(errors))
        }
    }

    /// Insert a resolved token, ignoring duplicates
    pub fn insert(&mut self, resolved: ResolvedToken) {
        if self.by_text.contains_key(&resolved.text) {
            return;
        }
        self.by_text.insert(resolved.text.clone(), self.tokens.len());
        self.tokens.push(resolved);
    }

    /// Look up a token by text (canonicalized before lookup)
    pub fn get(&self, text: &str) -> Option<&ResolvedToken> {
        let idx = match self.by_text.get(text) {
            Some(idx) => *idx,
            None => *self.by_text.get(&canonical_text(text))?,
        };
        self.tokens.get(idx)
    }

    /// Look up only the resolved token
    pub fn token(&self, text: &str) -> Option<&Token> {
        self.get(text).map(|r| &r.token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedToken> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::ast::TokenKind;
    use chrono::{NaiveDate, Weekday};

    fn ctx() -> ResolveContext {
        let now = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        ResolveContext::new(now, Weekday::Sun)
    }

    #[test]
    fn test_extract_tokens() {
        let tokens = extract_tokens("[Total];[ today - 1 ];plain;[PerMonth]");
        assert_eq!(tokens, vec!["total", "today-1", "permonth"]);
        assert!(extract_tokens("no tokens here").is_empty());
    }

    #[test]
    fn test_build_deduplicates_by_canonical_text() {
        let set = TokenSet::build(["[total]", "[TOTAL]", "[ total ]", "[week]"], &ctx()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("[Total]").unwrap().kind(), TokenKind::Range);
        assert_eq!(set.get("week").unwrap().text, "week");
        assert!(set.get("month").is_none());
    }

    #[test]
    fn test_build_reports_all_invalid_tokens() {
        let err = TokenSet::build(
            ["[total]", "[bogus]", "[month=13]", "[bogus]", "[recent=1]"],
            &ctx(),
        )
        .unwrap_err();

        match err {
            TokenError::Invalid(errors) => {
                assert_eq!(errors.len(), 3);
                assert_eq!(errors[0], TokenError::Unknown("bogus".to_string()));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_first_seen_order() {
        let set = TokenSet::build(["[unplayed]", "[recent]", "[unplayed]"], &ctx()).unwrap();
        let texts: Vec<&str> = set.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["unplayed", "recent"]);
    }
}
