//! Statistics
//!
//! - **Evaluator**: one value per token per file
//! - **Result**: scalar counts and per-period series
//! - **Aggregate**: grouped sums and template filling

mod aggregate;
mod error;
mod evaluator;
mod result;

pub use aggregate::{apply_group, FieldUpdate, GroupBy, GroupOutcome, StatGroup, TemplateFiller};
pub use error::{EvalResult, EvaluationError};
pub use evaluator::{evaluate_all, evaluate_file, evaluate_token};
pub use result::{StatResult, StatValue};
