//! Core data types for library files
//!
//! - `LibraryFile`: one file as enumerated by the media library
//! - `FileRecord`: a file with its normalized play history and computed stats

use crate::stats::StatResult;
use chrono::{DateTime, NaiveDateTime};
use std::collections::HashMap;

/// A file as read from the media library
///
/// Field names are stored lowercase; lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryFile {
    /// Library identifier
    pub key: u64,
    /// Display name
    pub name: String,
    /// Import time, Unix seconds (0 when unknown)
    pub imported: i64,
    /// Total play count as declared by the library
    pub declared_plays: u32,
    /// Raw play-history field
    pub history: String,
    /// Every other field read from the library
    pub fields: HashMap<String, String>,
}

impl LibraryFile {
    /// Create a file with the required fields
    pub fn new(key: u64, name: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder method: set import time (Unix seconds)
    pub fn imported(mut self, imported: i64) -> Self {
        self.imported = imported;
        self
    }

    /// Builder method: set declared play count
    pub fn plays(mut self, plays: u32) -> Self {
        self.declared_plays = plays;
        self
    }

    /// Builder method: set raw history
    pub fn history(mut self, history: impl Into<String>) -> Self {
        self.history = history.into();
        self
    }

    /// Builder method: add a field
    pub fn field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_lowercase(), value.into());
        self
    }

    /// Get a field value by name (case-insensitive)
    pub fn get_field(&self, name: &str) -> Option<&str> {
        self.fields.get(&name.to_lowercase()).map(String::as_str)
    }
}

/// A file with its normalized history, as processed by one run
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub key: u64,
    pub name: String,
    /// Import time, Unix seconds
    pub imported: i64,
    pub declared_plays: u32,
    pub fields: HashMap<String, String>,
    /// Observed and reconstructed play events, oldest first
    pub events: Vec<NaiveDateTime>,
    /// Number of events read from the history field
    pub observed: usize,
    /// Plays declared by the library but missing from the history
    pub prehistory_count: u32,
    /// Oldest event; doubles as the "last played" ordering signal
    pub earliest_play: Option<NaiveDateTime>,
    /// Computed statistics
    pub stats: StatResult,
}

impl FileRecord {
    /// Build a record from a library file and its observed events
    pub fn new(file: LibraryFile, mut observed: Vec<NaiveDateTime>) -> Self {
        observed.sort();
        let count = observed.len();
        let prehistory_count = (file.declared_plays as usize).saturating_sub(count) as u32;

        let mut record = Self {
            key: file.key,
            name: file.name,
            imported: file.imported,
            declared_plays: file.declared_plays,
            fields: file.fields,
            events: observed,
            observed: count,
            prehistory_count,
            earliest_play: None,
            stats: StatResult::default(),
        };
        record.refresh_bounds();
        record
    }

    /// Append reconstructed events and keep the list ordered
    pub fn add_reconstructed(&mut self, events: Vec<NaiveDateTime>) {
        if events.is_empty() {
            return;
        }
        self.events.extend(events);
        self.events.sort();
        self.refresh_bounds();
    }

    fn refresh_bounds(&mut self) {
        self.earliest_play = self.events.first().copied();
    }

    /// Number of reconstructed events in the list
    pub fn reconstructed(&self) -> usize {
        self.events.len() - self.observed
    }

    pub fn has_plays(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get a field value by name (case-insensitive)
    pub fn get_field(&self, name: &str) -> Option<&str> {
        self.fields.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Import time as a timestamp, if known
    pub fn imported_at(&self) -> Option<NaiveDateTime> {
        if self.imported <= 0 {
            return None;
        }
        DateTime::from_timestamp(self.imported, 0).map(|dt| dt.naive_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_library_file_fields_case_insensitive() {
        let file = LibraryFile::new(7, "Song").field("Artist", "X");
        assert_eq!(file.get_field("artist"), Some("X"));
        assert_eq!(file.get_field("ARTIST"), Some("X"));
        assert_eq!(file.get_field("album"), None);
    }

    #[test]
    fn test_imported_at() {
        let file = LibraryFile::new(1, "a").imported(1_700_000_000);
        let record = FileRecord::new(file, Vec::new());
        assert_eq!(
            record.imported_at().unwrap(),
            NaiveDate::from_ymd_opt(2023, 11, 14)
                .unwrap()
                .and_hms_opt(22, 13, 20)
                .unwrap()
        );
        assert!(FileRecord::new(LibraryFile::new(1, "a"), Vec::new())
            .imported_at()
            .is_none());
    }

    #[test]
    fn test_record_orders_events_and_counts_prehistory() {
        let file = LibraryFile::new(1, "a").plays(5);
        let record = FileRecord::new(file, vec![day(2024, 3, 1), day(2023, 1, 1)]);

        assert_eq!(record.events, vec![day(2023, 1, 1), day(2024, 3, 1)]);
        assert_eq!(record.observed, 2);
        assert_eq!(record.prehistory_count, 3);
        assert_eq!(record.earliest_play, Some(day(2023, 1, 1)));
    }

    #[test]
    fn test_record_without_plays() {
        let record = FileRecord::new(LibraryFile::new(1, "a"), Vec::new());
        assert!(!record.has_plays());
        assert_eq!(record.prehistory_count, 0);
        assert_eq!(record.earliest_play, None);
    }

    #[test]
    fn test_add_reconstructed_moves_earliest_play() {
        let file = LibraryFile::new(1, "a").plays(2);
        let mut record = FileRecord::new(file, vec![day(2024, 3, 1)]);
        record.add_reconstructed(vec![day(2020, 5, 5)]);

        assert_eq!(record.events.len(), 2);
        assert_eq!(record.reconstructed(), 1);
        assert_eq!(record.earliest_play, Some(day(2020, 5, 5)));
    }
}
