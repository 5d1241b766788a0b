//! History Normalizer
//!
//! A history field is a delimited list of timestamps, either spreadsheet
//! serial numbers (fractional days since 1899-12-30) or formatted date
//! strings. The mode is decided once per file from its first entry.

use crate::history::error::{HistoryError, HistoryResult};
use crate::library::LibraryFile;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Layouts tried when no history format is configured
pub const DEFAULT_FORMATS: [&str; 10] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d",
];

/// Identity of the file whose history is parsed, for error reporting
#[derive(Debug, Clone, Copy)]
pub struct FileIdentity<'a> {
    pub key: u64,
    pub name: &'a str,
}

impl<'a> From<&'a LibraryFile> for FileIdentity<'a> {
    fn from(file: &'a LibraryFile) -> Self {
        Self {
            key: file.key,
            name: &file.name,
        }
    }
}

/// Convert a spreadsheet serial date to a timestamp
pub fn excel_to_datetime(days: f64) -> Option<NaiveDateTime> {
    if !days.is_finite() {
        return None;
    }
    let millis = (days * 86_400_000.0).round();
    if millis.abs() >= i64::MAX as f64 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    base.checked_add_signed(Duration::try_milliseconds(millis as i64)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Numeric,
    Formatted,
}

/// Parses raw history fields into play events
#[derive(Debug, Clone)]
pub struct HistoryParser {
    separator: String,
    format: Option<String>,
    midnight_offset: Duration,
}

impl Default for HistoryParser {
    fn default() -> Self {
        Self::new(";")
    }
}

impl HistoryParser {
    /// Create a parser splitting entries on `separator`
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            format: None,
            midnight_offset: Duration::zero(),
        }
    }

    /// Set the strftime pattern for formatted entries; empty means auto-detect
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = if format.is_empty() {
            None
        } else {
            Some(format.to_string())
        };
        self
    }

    /// Set the offset (minutes) subtracted from every timestamp
    pub fn with_midnight_offset(mut self, minutes: i64) -> HistoryResult<Self> {
        self.midnight_offset =
            Duration::try_minutes(minutes).ok_or(HistoryError::InvalidOffset(minutes))?;
        Ok(self)
    }

    /// Parse one file's history into chronologically ordered events
    ///
    /// Any unparseable entry fails the whole file.
    pub fn parse(&self, raw: &str, file: FileIdentity<'_>) -> HistoryResult<Vec<NaiveDateTime>> {
        let entries: Vec<&str> = raw
            .split(self.separator.as_str())
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .collect();

        let Some(first) = entries.first() else {
            return Ok(Vec::new());
        };
        let mode = if parse_serial(first).is_some() {
            Mode::Numeric
        } else {
            Mode::Formatted
        };

        let mut events = Vec::with_capacity(entries.len());
        for entry in entries {
            let parsed = match mode {
                Mode::Numeric => parse_serial(entry).and_then(excel_to_datetime),
                Mode::Formatted => self.parse_formatted(entry),
            };
            let Some(t) = parsed else {
                return Err(HistoryError::Parse {
                    key: file.key,
                    name: file.name.to_string(),
                    value: entry.to_string(),
                });
            };
            let t = t
                .checked_sub_signed(self.midnight_offset)
                .ok_or_else(|| HistoryError::OutOfRange {
                    key: file.key,
                    name: file.name.to_string(),
                })?;
            events.push(t);
        }

        events.sort();
        Ok(events)
    }

    fn parse_formatted(&self, entry: &str) -> Option<NaiveDateTime> {
        if let Some(format) = &self.format {
            return parse_with(entry, format);
        }

        DEFAULT_FORMATS
            .iter()
            .find_map(|fmt| parse_with(entry, fmt))
            .or_else(|| {
                DateTime::parse_from_rfc3339(entry)
                    .ok()
                    .map(|dt| dt.naive_local())
            })
    }
}

fn parse_with(entry: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(entry, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(entry, format)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Parse a serial number, accepting `,` as the decimal separator
fn parse_serial(entry: &str) -> Option<f64> {
    let normalized = entry.replace(',', ".");
    if !normalized
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c == '-')
    {
        return None;
    }
    normalized.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn file() -> FileIdentity<'static> {
        FileIdentity {
            key: 42,
            name: "Song",
        }
    }

    #[test]
    fn test_excel_to_datetime() {
        assert_eq!(excel_to_datetime(45000.0), Some(at(2023, 3, 15, 0, 0)));
        assert_eq!(excel_to_datetime(45000.25), Some(at(2023, 3, 15, 6, 0)));
        assert_eq!(excel_to_datetime(0.0), Some(at(1899, 12, 30, 0, 0)));
        assert_eq!(excel_to_datetime(f64::NAN), None);
    }

    #[test]
    fn test_parse_numeric_history() {
        let parser = HistoryParser::new(";");
        let events = parser.parse("45000,5;45000.25;", file()).unwrap();
        assert_eq!(
            events,
            vec![at(2023, 3, 15, 6, 0), at(2023, 3, 15, 12, 0)]
        );
    }

    #[test]
    fn test_parse_empty_history() {
        let parser = HistoryParser::default();
        assert!(parser.parse("", file()).unwrap().is_empty());
        assert!(parser.parse(" ; ;", file()).unwrap().is_empty());
    }

    #[test]
    fn test_midnight_offset_is_subtracted() {
        let parser = HistoryParser::new(";").with_midnight_offset(60).unwrap();
        let events = parser.parse("45000", file()).unwrap();
        assert_eq!(events, vec![at(2023, 3, 14, 23, 0)]);
    }

    #[test]
    fn test_oversized_midnight_offset_rejected() {
        assert_eq!(
            HistoryParser::new(";").with_midnight_offset(i64::MAX).unwrap_err(),
            HistoryError::InvalidOffset(i64::MAX)
        );
    }

    #[test]
    fn test_parse_default_layouts() {
        let parser = HistoryParser::new("|");
        let events = parser
            .parse("2024-06-01 10:30:00|2024-06-02|2024-06-03T08:00:00+00:00", file())
            .unwrap();
        assert_eq!(
            events,
            vec![
                at(2024, 6, 1, 10, 30),
                at(2024, 6, 2, 0, 0),
                at(2024, 6, 3, 8, 0)
            ]
        );
    }

    #[test]
    fn test_parse_configured_format() {
        let parser = HistoryParser::new(";").with_format("%d.%m.%Y %H:%M");
        let events = parser.parse("01.06.2024 10:30;02.06.2024 11:00", file()).unwrap();
        assert_eq!(events, vec![at(2024, 6, 1, 10, 30), at(2024, 6, 2, 11, 0)]);

        let parser = HistoryParser::new(";").with_format("%d.%m.%Y");
        let events = parser.parse("01.06.2024", file()).unwrap();
        assert_eq!(events, vec![at(2024, 6, 1, 0, 0)]);
    }

    #[test]
    fn test_mode_decided_from_first_entry() {
        let parser = HistoryParser::new(";");
        let err = parser.parse("45000;2024-06-01", file()).unwrap_err();
        assert_eq!(
            err,
            HistoryError::Parse {
                key: 42,
                name: "Song".to_string(),
                value: "2024-06-01".to_string(),
            }
        );

        let err = parser.parse("2024-06-01;45000", file()).unwrap_err();
        assert!(matches!(err, HistoryError::Parse { value, .. } if value == "45000"));
    }

    #[test]
    fn test_unparseable_entry_fails_file() {
        let parser = HistoryParser::new(";");
        let err = parser.parse("yesterday", file()).unwrap_err();
        assert!(err.to_string().contains("42"));
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn test_identity_from_library_file() {
        let lib = LibraryFile::new(9, "Track");
        let id = FileIdentity::from(&lib);
        assert_eq!(id.key, 9);
        assert_eq!(id.name, "Track");
    }
}
