//! Media library model
//!
//! The engine never talks to a media library directly; it consumes a list of
//! [`LibraryFile`]s and produces field updates and playlists. The snapshot
//! loader reads that list from a JSON export.

mod error;
mod snapshot;
mod types;

pub use error::{LibraryError, LibraryResult};
pub use snapshot::{load_snapshot, parse_snapshot, FIELD_IMPORTED, FIELD_KEY, FIELD_NAME, FIELD_PLAYS};
pub use types::{FileRecord, LibraryFile};
