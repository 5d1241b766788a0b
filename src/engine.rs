//! Run pipeline
//!
//! One run processes one snapshot of the library:
//!
//! 1. parse every history field
//! 2. reduce the batch to its oldest observed play
//! 3. reconstruct pre-history and evaluate per-file statistics
//! 4. fill statistics templates
//! 5. build playlists
//!
//! Any error aborts the whole run before a report is produced.

use crate::config::{Config, ConfigError, EngineConfig};
use crate::context::RunContext;
use crate::history::{reconstruct, FileIdentity, HistoryError, HistoryParser};
use crate::library::{load_snapshot, FileRecord, LibraryError, LibraryFile};
use crate::playlist::{build_playlist, check_sortable, sort_by_earliest_play, Playlist, PlaylistDef};
use crate::stats::{apply_group, evaluate_all, EvaluationError, GroupOutcome, StatGroup, TemplateFiller};
use crate::token::{ResolveContext, TokenError, TokenSet};
use chrono::{Datelike, NaiveDateTime};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Errors that can abort a run
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Library(#[from] LibraryError),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Output of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Reference instant of the run
    pub now: NaiveDateTime,
    pub files: usize,
    /// Play events processed, observed and reconstructed
    pub total_events: usize,
    pub reconstructed_events: usize,
    pub stats: Vec<GroupOutcome>,
    pub playlists: Vec<Playlist>,
}

impl RunReport {
    pub fn field_updates(&self) -> usize {
        self.stats.iter().map(|g| g.updates.len()).sum()
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Run Report ({})", self.now)?;
        writeln!(f, "  Files: {}", self.files)?;
        writeln!(
            f,
            "  Play events: {} ({} reconstructed)",
            self.total_events, self.reconstructed_events
        )?;
        for group in &self.stats {
            writeln!(
                f,
                "  Field '{}': {} updated, {} unchanged",
                group.field,
                group.updates.len(),
                group.unchanged
            )?;
        }
        for playlist in &self.playlists {
            writeln!(f, "  Playlist '{}': {} files", playlist.name, playlist.files.len())?;
        }
        Ok(())
    }
}

/// The statistics engine, configured for one reference instant
#[derive(Debug, Clone)]
pub struct Engine {
    settings: EngineConfig,
    resolve: ResolveContext,
    tokens: TokenSet,
    groups: Vec<StatGroup>,
    playlists: Vec<PlaylistDef>,
}

impl Engine {
    /// Validate the configuration and resolve every token once
    ///
    /// Fails with every invalid token of the configuration at once.
    pub fn new(config: &Config, now: NaiveDateTime) -> EngineResult<Self> {
        config.validate()?;

        let resolve = ResolveContext::new(now, config.engine.week_start_day());
        let mut tokens = TokenSet::build(config.token_texts(), &resolve)?;

        let playlists = config.expanded_playlists(now.year())?;
        let expanded = TokenSet::build(playlists.iter().map(|p| p.token.as_str()), &resolve)?;
        for resolved in expanded.iter() {
            tokens.insert(resolved.clone());
        }
        for def in &playlists {
            check_sortable(def, &tokens)?;
        }

        let groups = config.stat_groups();
        tracing::info!(
            tokens = tokens.len(),
            groups = groups.len(),
            playlists = playlists.len(),
            "Engine configured"
        );

        Ok(Self {
            settings: config.engine.clone(),
            resolve,
            tokens,
            groups,
            playlists,
        })
    }

    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    pub fn playlists(&self) -> &[PlaylistDef] {
        &self.playlists
    }

    pub fn now(&self) -> NaiveDateTime {
        self.resolve.now
    }

    fn history_parser(&self) -> EngineResult<HistoryParser> {
        let parser = HistoryParser::new(self.settings.history_separator.as_str())
            .with_format(&self.settings.history_format)
            .with_midnight_offset(self.settings.midnight_offset)?;
        Ok(parser)
    }

    /// Parse histories, reconstruct pre-history and evaluate statistics
    ///
    /// Returns the evaluated records and the run context they were
    /// evaluated against.
    pub fn evaluate(&self, files: Vec<LibraryFile>) -> EngineResult<(Vec<FileRecord>, RunContext)> {
        let parser = self.history_parser()?;

        let parsed: Vec<(LibraryFile, Vec<NaiveDateTime>)> = {
            let _span = tracing::info_span!("parse_histories", files = files.len()).entered();
            files
                .into_par_iter()
                .map(|file| {
                    parser
                        .parse(&file.history, FileIdentity::from(&file))
                        .map(|events| (file, events))
                })
                .collect::<Result<_, HistoryError>>()?
        };

        let earliest = parsed
            .iter()
            .filter_map(|(_, events)| events.first().copied())
            .min();
        let ctx = RunContext::from_reductions(self.resolve, earliest);
        tracing::debug!(
            history_floor = %ctx.history_floor,
            earliest_year = ctx.earliest_year,
            "Computed run-wide reductions"
        );

        let _span = tracing::info_span!("evaluate").entered();
        let infer = self.settings.infer_prehistory;
        let mut records: Vec<FileRecord> = parsed
            .into_par_iter()
            .map(|(file, events)| {
                let mut record = FileRecord::new(file, events);
                if infer && record.prehistory_count > 0 {
                    let synthetic = reconstruct(
                        record.imported_at(),
                        record.prehistory_count as usize,
                        ctx.history_floor,
                    );
                    record.add_reconstructed(synthetic);
                }
                record
            })
            .collect();

        evaluate_all(&mut records, &self.tokens, &ctx);
        Ok((records, ctx))
    }

    /// Load a JSON library snapshot and run over it
    pub fn run_snapshot(&self, path: &Path) -> EngineResult<RunReport> {
        let files = load_snapshot(path, &self.settings.history_field)?;
        self.run(files)
    }

    /// Run every enabled stage over a library snapshot
    pub fn run(&self, files: Vec<LibraryFile>) -> EngineResult<RunReport> {
        let file_count = files.len();
        tracing::info!(files = file_count, now = %self.resolve.now, "Starting run");

        let (records, _ctx) = self.evaluate(files)?;
        let total_events: usize = records.iter().map(|r| r.events.len()).sum();
        let reconstructed_events: usize = records.iter().map(FileRecord::reconstructed).sum();

        let mut stats = Vec::new();
        if self.settings.update_stats {
            let _span = tracing::info_span!("fill_templates", groups = self.groups.len()).entered();
            let filler = TemplateFiller::new(&self.tokens, &self.settings.series_separator);
            for group in &self.groups {
                stats.push(apply_group(group, &records, &filler)?);
            }
        }

        let mut playlists = Vec::new();
        if self.settings.update_playlists {
            let _span =
                tracing::info_span!("build_playlists", playlists = self.playlists.len()).entered();
            let sorted = sort_by_earliest_play(&records);
            for def in &self.playlists {
                playlists.push(build_playlist(def, &sorted, &self.tokens)?);
            }
        }

        let report = RunReport {
            now: self.resolve.now,
            files: file_count,
            total_events,
            reconstructed_events,
            stats,
            playlists,
        };
        tracing::info!(
            events = report.total_events,
            updates = report.field_updates(),
            playlists = report.playlists.len(),
            "Run complete"
        );
        Ok(report)
    }
}
