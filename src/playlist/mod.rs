//! Playlists
//!
//! Definitions are expanded once per run (per-year playlists become one
//! playlist per year); each is then rebuilt from scratch from the evaluated
//! files.

mod builder;
mod definition;

pub use builder::{build_playlist, check_sortable, sort_by_earliest_play, Playlist};
pub use definition::{expand_definition, year_name, PlaylistDef, DEFAULT_LIST_SIZE};
