//! Playlist Builder
//!
//! Ranks files by a playlist's token and truncates to its maximum size.
//! Every ordering is a stable sort over the input, which is pre-sorted by
//! earliest play (most recent first, files without plays last), so equal
//! keys keep that order.

use crate::library::FileRecord;
use crate::playlist::definition::PlaylistDef;
use crate::stats::{EvalResult, EvaluationError};
use crate::token::{Token, TokenSet};
use serde::Serialize;
use std::cmp::Reverse;

/// A built playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Playlist {
    pub name: String,
    pub token: String,
    pub max: usize,
    /// Member file keys, in playlist order
    pub files: Vec<u64>,
}

/// Order files by earliest play, most recent first, files without plays last
pub fn sort_by_earliest_play(files: &[FileRecord]) -> Vec<&FileRecord> {
    let mut sorted: Vec<&FileRecord> = files.iter().collect();
    sorted.sort_by_key(|f| Reverse(f.earliest_play));
    sorted
}

/// Reject tokens that cannot order a playlist
pub fn check_sortable(def: &PlaylistDef, tokens: &TokenSet) -> EvalResult<()> {
    let token = tokens
        .token(&def.token)
        .ok_or_else(|| EvaluationError::UnknownToken(def.token.clone()))?;
    if token.is_series() {
        return Err(EvaluationError::NotSortable {
            playlist: def.name.clone(),
            token: def.token.clone(),
        });
    }
    Ok(())
}

/// Build one playlist from pre-sorted files
pub fn build_playlist(
    def: &PlaylistDef,
    sorted: &[&FileRecord],
    tokens: &TokenSet,
) -> EvalResult<Playlist> {
    check_sortable(def, tokens)?;
    let resolved = tokens
        .get(&def.token)
        .ok_or_else(|| EvaluationError::UnknownToken(def.token.clone()))?;

    let mut members: Vec<&FileRecord> = match &resolved.token {
        Token::Unplayed => {
            let mut files = filter(sorted, |f| !f.has_plays());
            files.sort_by_key(|f| Reverse(f.imported));
            files
        }
        Token::Recent => {
            let mut files = filter(sorted, FileRecord::has_plays);
            files.sort_by_key(|f| Reverse(f.earliest_play));
            files
        }
        Token::Unpopular => {
            let mut files = filter(sorted, FileRecord::has_plays);
            files.sort_by_key(|f| f.earliest_play);
            files
        }
        Token::PreHistory => {
            let mut files = filter(sorted, |f| f.prehistory_count > 0);
            files.sort_by_key(|f| Reverse(f.prehistory_count));
            files
        }
        _ => {
            let mut ranked = Vec::new();
            for file in sorted {
                let value = file.stats.require(&resolved.text)?.count();
                if value > 0 {
                    ranked.push((value, *file));
                }
            }
            ranked.sort_by_key(|(value, _)| Reverse(*value));
            ranked.into_iter().map(|(_, file)| file).collect()
        }
    };

    if def.max > 0 {
        members.truncate(def.max);
    }

    tracing::debug!(
        playlist = %def.name,
        token = %def.token,
        files = members.len(),
        "Built playlist"
    );

    Ok(Playlist {
        name: def.name.clone(),
        token: def.token.clone(),
        max: def.max,
        files: members.iter().map(|f| f.key).collect(),
    })
}

fn filter<'a>(sorted: &[&'a FileRecord], keep: impl Fn(&FileRecord) -> bool) -> Vec<&'a FileRecord> {
    sorted.iter().copied().filter(|f| keep(f)).collect()
}
