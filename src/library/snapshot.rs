//! JSON library snapshot
//!
//! A snapshot is an array of objects, one per file. Field names are matched
//! case-insensitively and values may be strings or numbers:
//!
//! ```json
//! [
//!   {"Key": 1, "Name": "Song", "Date Imported": "1700000000",
//!    "Number Plays": 3, "Play History": "45000.5;45010.25", "Artist": "X"}
//! ]
//! ```

use crate::library::error::{LibraryError, LibraryResult};
use crate::library::types::LibraryFile;
use serde_json::{Map, Value};
use std::path::Path;

pub const FIELD_KEY: &str = "key";
pub const FIELD_NAME: &str = "name";
pub const FIELD_IMPORTED: &str = "date imported";
pub const FIELD_PLAYS: &str = "number plays";

/// Read a snapshot file
pub fn load_snapshot(path: &Path, history_field: &str) -> LibraryResult<Vec<LibraryFile>> {
    let content = std::fs::read_to_string(path).map_err(|e| LibraryError::Io {
        path: path.to_path_buf(),
        error: e,
    })?;
    let files = parse_snapshot(&content, history_field)?;
    tracing::debug!(path = %path.display(), files = files.len(), "Loaded library snapshot");
    Ok(files)
}

/// Parse snapshot JSON
pub fn parse_snapshot(json: &str, history_field: &str) -> LibraryResult<Vec<LibraryFile>> {
    let value: Value = serde_json::from_str(json)?;
    let entries = match value {
        Value::Array(entries) => entries,
        _ => return Err(LibraryError::NotAnArray),
    };

    let history_field = history_field.to_lowercase();
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            Value::Object(map) => parse_file(index, map, &history_field),
            _ => Err(LibraryError::NotAnObject { index }),
        })
        .collect()
}

fn parse_file(
    index: usize,
    map: Map<String, Value>,
    history_field: &str,
) -> LibraryResult<LibraryFile> {
    let mut file = LibraryFile::default();

    for (name, value) in map {
        let Some(text) = value_text(&value) else {
            continue;
        };
        file.fields.insert(name.to_lowercase(), text);
    }

    let key = file
        .get_field(FIELD_KEY)
        .ok_or_else(|| LibraryError::MissingField {
            index,
            field: "Key".to_string(),
        })?;
    file.key = parse_number(index, "Key", key)?;
    file.name = file.get_field(FIELD_NAME).unwrap_or_default().to_string();
    file.imported = match file.get_field(FIELD_IMPORTED) {
        Some(v) if !v.is_empty() => parse_number(index, "Date Imported", v)?,
        _ => 0,
    };
    file.declared_plays = match file.get_field(FIELD_PLAYS) {
        Some(v) if !v.is_empty() => parse_number(index, "Number Plays", v)?,
        _ => 0,
    };
    file.history = file.get_field(history_field).unwrap_or_default().to_string();

    Ok(file)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_number<T: std::str::FromStr>(index: usize, field: &str, value: &str) -> LibraryResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| LibraryError::InvalidField {
            index,
            field: field.to_string(),
            value: value.to_string(),
        })
}
