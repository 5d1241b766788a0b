//! Grouped aggregation and template filling
//!
//! A statistics group fills one template per file and writes it to one
//! field. Per-file groups use each file's own statistics; grouped ones sum
//! the statistics of every file sharing a group-key value.

use crate::library::FileRecord;
use crate::stats::error::{EvalResult, EvaluationError};
use crate::stats::result::StatResult;
use crate::token::{canonical_text, token_pattern, TokenSet};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

/// How files are grouped before filling a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupBy {
    /// Each file on its own
    File,
    /// Files sharing a value of this field (compared case-insensitively)
    Field(String),
}

impl GroupBy {
    /// Interpret a configured group-by field name; empty or `key` means per file
    pub fn from_field(field: &str) -> Self {
        let field = field.trim();
        if field.is_empty() || field.eq_ignore_ascii_case("key") {
            Self::File
        } else {
            Self::Field(field.to_string())
        }
    }
}

/// One statistics group definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatGroup {
    pub update_field: String,
    pub group_by: GroupBy,
    pub template: String,
    pub append: bool,
}

/// A changed field value to write back to the library
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldUpdate {
    pub key: u64,
    pub name: String,
    pub field: String,
    pub value: String,
}

/// Result of applying one statistics group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupOutcome {
    pub field: String,
    pub updates: Vec<FieldUpdate>,
    pub unchanged: usize,
}

/// Substitutes token values into template text
#[derive(Debug, Clone, Copy)]
pub struct TemplateFiller<'a> {
    tokens: &'a TokenSet,
    series_separator: &'a str,
}

impl<'a> TemplateFiller<'a> {
    pub fn new(tokens: &'a TokenSet, series_separator: &'a str) -> Self {
        Self {
            tokens,
            series_separator,
        }
    }

    /// Replace every `[token]` in the template with its value
    ///
    /// Fails if a token of the template was not resolved for this run.
    pub fn fill(&self, template: &str, stats: &StatResult) -> EvalResult<String> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;

        for caps in token_pattern().captures_iter(template) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let text = canonical_text(&caps[1]);
            let resolved = self
                .tokens
                .get(&text)
                .ok_or_else(|| EvaluationError::UnknownToken(text.clone()))?;
            let value = stats.require(&resolved.text)?;

            out.push_str(&template[last..whole.start()]);
            out.push_str(&value.render(self.series_separator));
            last = whole.end();
        }

        out.push_str(&template[last..]);
        Ok(out)
    }
}

/// Fill a statistics group for every file
///
/// Only values that differ from the field's current value produce a
/// [`FieldUpdate`]; the rest are counted as unchanged.
pub fn apply_group(
    group: &StatGroup,
    files: &[FileRecord],
    filler: &TemplateFiller<'_>,
) -> EvalResult<GroupOutcome> {
    let filled: Vec<String> = match &group.group_by {
        GroupBy::File => files
            .par_iter()
            .map(|file| filler.fill(&group.template, &file.stats))
            .collect::<EvalResult<_>>()?,
        GroupBy::Field(field) => fill_grouped(group, field, files, filler)?,
    };

    let mut outcome = GroupOutcome {
        field: group.update_field.clone(),
        updates: Vec::new(),
        unchanged: 0,
    };

    for (file, value) in files.iter().zip(filled) {
        let current = file.get_field(&group.update_field).unwrap_or_default();
        let value = if group.append {
            format!("{current}{value}")
        } else {
            value
        };

        if value == current {
            outcome.unchanged += 1;
        } else {
            outcome.updates.push(FieldUpdate {
                key: file.key,
                name: file.name.clone(),
                field: group.update_field.clone(),
                value,
            });
        }
    }

    tracing::debug!(
        field = %outcome.field,
        updated = outcome.updates.len(),
        unchanged = outcome.unchanged,
        "Applied statistics group"
    );
    Ok(outcome)
}

/// Group key of a file; a missing field falls into the empty group
fn group_key(file: &FileRecord, field: &str) -> String {
    file.get_field(field).unwrap_or_default().to_lowercase()
}

fn fill_grouped(
    group: &StatGroup,
    field: &str,
    files: &[FileRecord],
    filler: &TemplateFiller<'_>,
) -> EvalResult<Vec<String>> {
    let mut members: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, file) in files.iter().enumerate() {
        members.entry(group_key(file, field)).or_default().push(idx);
    }

    let mut memo: HashMap<String, String> = HashMap::new();
    let mut filled = Vec::with_capacity(files.len());

    for file in files {
        let key = group_key(file, field);
        if let Some(value) = memo.get(&key) {
            filled.push(value.clone());
            continue;
        }

        let indices = members.get(&key).map(Vec::as_slice).unwrap_or_default();
        let total = StatResult::sum(indices.iter().map(|&i| &files[i].stats));
        let value = filler.fill(&group.template, &total)?;
        tracing::debug!(group = %key, files = indices.len(), "Filled group template");

        memo.insert(key, value.clone());
        filled.push(value);
    }

    Ok(filled)
}
