//! Playstats Token Language
//!
//! Tokens are the `[...]` expressions embedded in statistics templates and
//! playlist definitions:
//!
//! - **AST**: unresolved syntax and resolved token types
//! - **Parser**: token text into syntax
//! - **Window**: calendar arithmetic against the run's reference instant
//! - **Registry**: de-duplicated, resolve-once token set
//!
//! # Token Language
//!
//! ```text
//! [today]  [today-1]  [week-1,2w]  [month]  [year-1]  [now-6,6h]
//! [date=2024-06-01,1m]
//! [year=2023]  [month=dec]  [weekday=sat,sun]  [weekends]
//! [total]  [recent]  [unpopular]  [unplayed]  [prehistory]
//! [peryear=2015]  [permonth]  [perweekday]
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use playstats::token::{ResolveContext, TokenSet, extract_tokens};
//!
//! let ctx = ResolveContext::new(now, chrono::Weekday::Mon);
//! let set = TokenSet::build(extract_tokens("[total];[today-30d,31d]"), &ctx)?;
//! ```

mod ast;
mod error;
mod parser;
mod registry;
mod window;

pub use ast::{
    Amount, Anchor, Keyword, ResolvedToken, Token, TokenExpr, TokenKind, Unit, WeekdayList,
    WeekdaySet,
};
pub use error::{TokenError, TokenResult};
pub use parser::{canonical_text, month_from_name, parse_token, weekday_from_name};
pub use registry::{extract_tokens, resolve_token, token_pattern, TokenSet};
pub use window::{shift, ResolveContext, TimeWindow, MAX_YEAR, MIN_YEAR};
