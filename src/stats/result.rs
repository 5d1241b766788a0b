//! Statistic values

use crate::stats::error::{EvalResult, EvaluationError};
use serde::Serialize;
use std::collections::HashMap;

/// Value computed for one token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Count(i64),
    Series(Vec<i64>),
}

impl StatValue {
    /// Scalar value; zero for series
    pub fn count(&self) -> i64 {
        match self {
            Self::Count(n) => *n,
            Self::Series(_) => 0,
        }
    }

    /// Render for template substitution
    pub fn render(&self, separator: &str) -> String {
        match self {
            Self::Count(n) => n.to_string(),
            Self::Series(values) => values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(separator),
        }
    }

    /// Add another value: scalars sum, series sum element-wise
    ///
    /// The shorter series is padded with zeros. A scalar never mixes into a
    /// series; the series wins.
    pub fn accumulate(&mut self, other: &StatValue) {
        match other {
            Self::Count(b) => {
                if let Self::Count(a) = self {
                    *a += b;
                }
            }
            Self::Series(b) => match self {
                Self::Series(a) => {
                    if a.len() < b.len() {
                        a.resize(b.len(), 0);
                    }
                    for (x, y) in a.iter_mut().zip(b) {
                        *x += y;
                    }
                }
                Self::Count(_) => *self = Self::Series(b.clone()),
            },
        }
    }
}

impl std::fmt::Display for StatValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(","))
    }
}

/// Per-file mapping of token text to computed value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatResult {
    values: HashMap<String, StatValue>,
}

impl StatResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, text: impl Into<String>, value: StatValue) {
        self.values.insert(text.into(), value);
    }

    pub fn get(&self, text: &str) -> Option<&StatValue> {
        self.values.get(text)
    }

    /// Value for a token that must have been computed
    pub fn require(&self, text: &str) -> EvalResult<&StatValue> {
        self.values
            .get(text)
            .ok_or_else(|| EvaluationError::UnknownToken(text.to_string()))
    }

    /// Scalar value for a token; zero when missing or a series
    pub fn count(&self, text: &str) -> i64 {
        self.values.get(text).map_or(0, StatValue::count)
    }

    /// Token-by-token sum of several results
    pub fn sum<'a>(results: impl IntoIterator<Item = &'a StatResult>) -> StatResult {
        let mut total = StatResult::new();
        for result in results {
            for (text, value) in &result.values {
                match total.values.get_mut(text) {
                    Some(existing) => existing.accumulate(value),
                    None => {
                        total.values.insert(text.clone(), value.clone());
                    }
                }
            }
        }
        total
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StatValue)> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        assert_eq!(StatValue::Count(8).render(","), "8");
        assert_eq!(StatValue::Series(vec![1, 0, 3]).render("|"), "1|0|3");
        assert_eq!(StatValue::Series(vec![]).render(","), "");
    }

    #[test]
    fn test_accumulate_pads_shorter_series() {
        let mut a = StatValue::Series(vec![1, 2]);
        a.accumulate(&StatValue::Series(vec![10, 20, 30]));
        assert_eq!(a, StatValue::Series(vec![11, 22, 30]));

        let mut b = StatValue::Series(vec![1, 2, 3]);
        b.accumulate(&StatValue::Series(vec![1]));
        assert_eq!(b, StatValue::Series(vec![2, 2, 3]));
    }

    #[test]
    fn test_sum_results() {
        let mut a = StatResult::new();
        a.insert("total", StatValue::Count(3));
        a.insert("permonth", StatValue::Series(vec![1, 2]));

        let mut b = StatResult::new();
        b.insert("total", StatValue::Count(5));
        b.insert("permonth", StatValue::Series(vec![0, 1]));
        b.insert("recent", StatValue::Count(1));

        let sum = StatResult::sum([&a, &b]);
        assert_eq!(sum.get("total"), Some(&StatValue::Count(8)));
        assert_eq!(sum.get("permonth"), Some(&StatValue::Series(vec![1, 3])));
        assert_eq!(sum.count("recent"), 1);
        assert_eq!(sum.count("missing"), 0);
    }

    #[test]
    fn test_require_missing_token() {
        let result = StatResult::new();
        assert_eq!(
            result.require("today"),
            Err(EvaluationError::UnknownToken("today".to_string()))
        );
    }
}
