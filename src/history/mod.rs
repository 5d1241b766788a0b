//! Play history normalization
//!
//! Turns a file's raw history field into an ordered list of play events and
//! reconstructs "pre-history" events for plays the library counted but never
//! recorded a timestamp for.

mod error;
mod normalizer;
mod prehistory;

pub use error::{HistoryError, HistoryResult};
pub use normalizer::{excel_to_datetime, FileIdentity, HistoryParser, DEFAULT_FORMATS};
pub use prehistory::{prehistory_sentinel, reconstruct};
