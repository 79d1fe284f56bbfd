mod engine;
mod mods;
mod recalc;

pub use engine::{
    ACCURACY_PP, AIM_PP, EFFECTIVE_MISS_COUNT, EngineError, FLASHLIGHT_PP, MAP_MAX_COMBO,
    PerformanceEngine, PerformanceRating, RosuEngine, SPEED_PP, STARS,
};
pub use mods::LegacyMods;
pub use recalc::{MapContext, RecalcError, recalculate, select_best};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::db::ReplayRecord;

/// Canonical score handed to the scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSnapshot {
    pub accuracy: f64,
    pub max_combo: u32,
    pub map_max_combo: u32,
    pub count_great: u32,
    pub count_good: u32,
    pub count_meh: u32,
    pub count_miss: u32,
    pub mods: LegacyMods,
}

impl ScoreSnapshot {
    /// Builds the snapshot from a replay's legacy counters.
    ///
    /// With `no_chokes` the play is treated as a full combo: no misses, combo
    /// equal to the map maximum, and greats filling whatever goods and mehs
    /// leave of that combo.
    pub fn from_replay(replay: &ReplayRecord, map_max_combo: u32, no_chokes: bool) -> Self {
        let (count_great, count_miss, max_combo) = if no_chokes {
            let great = map_max_combo
                .saturating_sub(replay.count_100)
                .saturating_sub(replay.count_50);
            (great, 0, map_max_combo)
        } else {
            (replay.count_300, replay.count_miss, replay.max_combo)
        };

        ScoreSnapshot {
            accuracy: accuracy(count_great, replay.count_100, replay.count_50, count_miss),
            max_combo,
            map_max_combo,
            count_great,
            count_good: replay.count_100,
            count_meh: replay.count_50,
            count_miss,
            mods: replay.mods,
        }
    }
}

/// osu!standard accuracy as a fraction in `[0, 1]`.
pub fn accuracy(great: u32, good: u32, meh: u32, miss: u32) -> f64 {
    let total = great as f64 + good as f64 + meh as f64 + miss as f64;
    if total == 0.0 {
        return 0.0;
    }
    (300.0 * great as f64 + 100.0 * good as f64 + 50.0 * meh as f64) / (300.0 * total)
}

/// Outcome of recalculating one replay against its beatmap.
#[derive(Debug, Clone, Serialize)]
pub struct RecalculatedScore {
    pub checksum: String,
    pub map_name: String,
    pub player: String,
    pub timestamp: DateTime<Utc>,
    pub pp: f64,
    pub attributes: BTreeMap<String, f64>,
    pub score: ScoreSnapshot,
}

impl RecalculatedScore {
    pub fn attribute(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).copied()
    }
}
