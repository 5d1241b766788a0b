//! Pre-history reconstruction
//!
//! Libraries often count plays that predate the recorded history. Those
//! plays are spread evenly between the file's import time and the oldest
//! observed play of the whole batch, so they never appear more recent than
//! anything genuinely observed.

use crate::token::{shift, Unit};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Oldest instant a reconstructed play may start from (2000-01-01)
pub fn prehistory_sentinel() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
}

/// Synthesize `count` evenly spaced events in `[start, floor)`
///
/// `start` is the import time, clamped to the sentinel date. When it would
/// fall at or after `floor` it is pushed back to one year before `floor`.
pub fn reconstruct(
    imported: Option<NaiveDateTime>,
    count: usize,
    floor: NaiveDateTime,
) -> Vec<NaiveDateTime> {
    if count == 0 {
        return Vec::new();
    }

    let sentinel = prehistory_sentinel();
    let mut start = imported.map_or(sentinel, |t| t.max(sentinel));
    if start >= floor {
        start = shift(floor, -1, Unit::Year).unwrap_or(sentinel);
    }

    let span = (floor - start).num_milliseconds();
    let step = span / count as i64;

    (0..count as i64)
        .filter_map(|i| start.checked_add_signed(chrono::Duration::try_milliseconds(step * i)?))
        .collect()
}
