use std::any::Any;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::calc::{EngineError, PerformanceEngine, RecalculatedScore, ScoreSnapshot};
use crate::config::RunOptions;
use crate::db::{GameMode, ReplayRecord, map_display_name};

/// Why a replay produced no score. None of these abort the run.
#[derive(Error, Debug)]
pub enum RecalcError {
    /// Checksum is not a ranked beatmap in the catalog.
    #[error("beatmap is not ranked or not in the catalog")]
    UnknownMap,

    #[error("couldn't find map {}", .0.display())]
    MissingMapFile(PathBuf),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A loaded beatmap plus its difficulty per mod combination.
pub struct MapContext<'e, E: PerformanceEngine> {
    engine: &'e E,
    map_name: String,
    beatmap: E::Beatmap,
    difficulties: HashMap<u32, E::Difficulty>,
}

impl<'e, E: PerformanceEngine> MapContext<'e, E> {
    pub fn open(engine: &'e E, path: Option<&Path>) -> Result<Self, RecalcError> {
        let path = path.ok_or(RecalcError::UnknownMap)?;
        if !path.is_file() {
            return Err(RecalcError::MissingMapFile(path.to_path_buf()));
        }
        let beatmap = guarded(|| engine.load_beatmap(path))?;

        Ok(Self {
            engine,
            map_name: map_display_name(path),
            beatmap,
            difficulties: HashMap::new(),
        })
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }
}

/// Recalculates one replay on an opened beatmap.
pub fn recalculate<E: PerformanceEngine>(
    ctx: &mut MapContext<'_, E>,
    checksum: &str,
    replay: &ReplayRecord,
    options: &RunOptions,
) -> Result<RecalculatedScore, RecalcError> {
    let engine = ctx.engine;
    let difficulty = match ctx.difficulties.entry(replay.mods.bits()) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => {
            let beatmap = &ctx.beatmap;
            entry.insert(guarded(|| engine.difficulty(beatmap, replay.mods))?)
        }
    };

    let map_max_combo = engine.max_combo(difficulty);
    let score = ScoreSnapshot::from_replay(replay, map_max_combo, options.no_chokes);
    let rating = guarded(|| engine.performance(difficulty, &score))?;

    Ok(RecalculatedScore {
        checksum: checksum.to_owned(),
        map_name: ctx.map_name.clone(),
        player: replay.player.clone(),
        timestamp: replay.timestamp,
        pp: rating.pp,
        attributes: rating.attributes,
        score,
    })
}

/// Returns the highest rated qualifying replay on one beatmap.
///
/// Only osu!standard replays by allowed players qualify. Ties keep the replay
/// that comes first.
pub fn select_best<E: PerformanceEngine>(
    engine: &E,
    checksum: &str,
    replays: &[ReplayRecord],
    path: Option<&Path>,
    options: &RunOptions,
) -> Option<RecalculatedScore> {
    let mut qualifying = replays
        .iter()
        .filter(|r| r.mode == GameMode::Standard && options.players.allows(&r.player))
        .peekable();
    qualifying.peek()?;

    let mut ctx = match MapContext::open(engine, path) {
        Ok(ctx) => ctx,
        // Probably an unranked map
        Err(RecalcError::UnknownMap) => {
            log::trace!("no ranked beatmap with hash {checksum}");
            return None;
        }
        Err(e) => {
            log::warn!("{e}");
            return None;
        }
    };

    let mut best: Option<RecalculatedScore> = None;
    for replay in qualifying {
        match recalculate(&mut ctx, checksum, replay, options) {
            Ok(score) => {
                if best.as_ref().is_none_or(|b| score.pp > b.pp) {
                    best = Some(score);
                }
            }
            Err(e) => log::warn!(
                "failed to recalculate {}'s play on {} from {}: {e}",
                replay.player,
                ctx.map_name(),
                replay.timestamp
            ),
        }
    }

    if best.is_some() {
        log::debug!("Done with {}", ctx.map_name());
    }
    best
}

fn guarded<T>(f: impl FnOnce() -> Result<T, EngineError>) -> Result<T, EngineError> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(EngineError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
