//! # Playstats
//!
//! Play statistics and smart playlists for a media library, driven by a small
//! token language embedded in text templates.
//!
//! ## Features
//!
//! - **Token language**: relative and absolute time windows, calendar
//!   selectors, per-period series and classification keywords
//! - **History normalization**: spreadsheet serial dates or formatted
//!   timestamps, with reconstruction of plays older than the recorded history
//! - **Grouped statistics**: per-file or summed across files sharing a field
//! - **Playlists**: ranked and size-capped, with per-year expansion
//!
//! ## Modules
//!
//! - [`token`]: Token parser, resolver and registry
//! - [`history`]: Play history normalization
//! - [`stats`]: Per-file evaluation, grouping and template filling
//! - [`playlist`]: Playlist definitions and builder
//! - [`engine`]: The run pipeline
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use playstats::{Config, Engine, LibraryFile};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let now = chrono::Local::now().naive_local();
//!     let engine = Engine::new(&config, now)?;
//!
//!     let files = vec![LibraryFile::new(1, "Song").plays(3).history("45000.5;45010.25")];
//!     let report = engine.run(files)?;
//!
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod engine;
pub mod history;
pub mod library;
pub mod playlist;
pub mod stats;
pub mod token;

// Re-export top-level types for convenience
pub use config::{
    generate_default_config, Config, ConfigError, EngineConfig, LoggingConfig, PlaylistConfig,
    StatsConfig,
};

pub use context::RunContext;

pub use engine::{Engine, EngineError, EngineResult, RunReport};

pub use history::{HistoryError, HistoryParser};

pub use library::{load_snapshot, FileRecord, LibraryError, LibraryFile};

pub use playlist::{Playlist, PlaylistDef};

pub use stats::{EvaluationError, FieldUpdate, GroupOutcome, StatResult, StatValue};

pub use token::{ResolveContext, Token, TokenError, TokenKind, TokenSet};
