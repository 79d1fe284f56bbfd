//! Scoring engine seam.
//!
//! The recalculator only talks to [`PerformanceEngine`]. [`RosuEngine`] is the
//! production backend built on rosu-pp; tests plug in deterministic engines.

use rosu_pp::any::{DifficultyAttributes, PerformanceAttributes};
use rosu_pp::{Beatmap, Difficulty, Performance};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::calc::{LegacyMods, ScoreSnapshot};

pub const AIM_PP: &str = "Aim pp";
pub const SPEED_PP: &str = "Speed pp";
pub const ACCURACY_PP: &str = "Accuracy pp";
pub const FLASHLIGHT_PP: &str = "Flashlight pp";
pub const EFFECTIVE_MISS_COUNT: &str = "Effective miss count";
pub const STARS: &str = "Stars";
pub const MAP_MAX_COMBO: &str = "Map max combo";

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to load beatmap {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("calculation failed: {0}")]
    Calculation(String),

    #[error("engine panicked: {0}")]
    Panicked(String),
}

/// A rating plus whatever named sub-ratings the engine variant produces.
///
/// Attribute keys differ between engines, so lookups go through
/// [`PerformanceRating::attribute`] and callers handle absence themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceRating {
    pub pp: f64,
    pub attributes: BTreeMap<String, f64>,
}

impl PerformanceRating {
    pub fn attribute(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).copied()
    }
}

pub trait PerformanceEngine: Sync {
    type Beatmap;
    type Difficulty;

    /// Every attribute name this engine can put into a [`PerformanceRating`].
    fn attribute_names(&self) -> &[&'static str];

    fn load_beatmap(&self, path: &Path) -> Result<Self::Beatmap, EngineError>;

    fn difficulty(
        &self,
        map: &Self::Beatmap,
        mods: LegacyMods,
    ) -> Result<Self::Difficulty, EngineError>;

    /// Highest combo reachable on the map under the difficulty's mods.
    fn max_combo(&self, difficulty: &Self::Difficulty) -> u32;

    fn performance(
        &self,
        difficulty: &Self::Difficulty,
        score: &ScoreSnapshot,
    ) -> Result<PerformanceRating, EngineError>;
}

/// osu!standard pp via rosu-pp.
#[derive(Debug, Clone, Copy, Default)]
pub struct RosuEngine;

impl RosuEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PerformanceEngine for RosuEngine {
    type Beatmap = Beatmap;
    type Difficulty = DifficultyAttributes;

    fn attribute_names(&self) -> &[&'static str] {
        &[
            AIM_PP,
            SPEED_PP,
            ACCURACY_PP,
            FLASHLIGHT_PP,
            EFFECTIVE_MISS_COUNT,
            STARS,
            MAP_MAX_COMBO,
        ]
    }

    fn load_beatmap(&self, path: &Path) -> Result<Beatmap, EngineError> {
        Beatmap::from_path(path).map_err(|source| EngineError::Load {
            path: path.to_path_buf(),
            source,
        })
    }

    fn difficulty(
        &self,
        map: &Beatmap,
        mods: LegacyMods,
    ) -> Result<DifficultyAttributes, EngineError> {
        Ok(Difficulty::new().mods(mods.bits()).calculate(map))
    }

    fn max_combo(&self, difficulty: &DifficultyAttributes) -> u32 {
        difficulty.max_combo()
    }

    fn performance(
        &self,
        difficulty: &DifficultyAttributes,
        score: &ScoreSnapshot,
    ) -> Result<PerformanceRating, EngineError> {
        let attrs = Performance::new(difficulty.clone())
            .mods(score.mods.bits())
            .combo(score.max_combo)
            .n300(score.count_great)
            .n100(score.count_good)
            .n50(score.count_meh)
            .misses(score.count_miss)
            .calculate();

        let pp = attrs.pp();
        if !pp.is_finite() {
            return Err(EngineError::Calculation(format!("non-finite pp {pp}")));
        }

        let mut attributes = BTreeMap::new();
        attributes.insert(STARS.to_owned(), difficulty.stars());
        attributes.insert(MAP_MAX_COMBO.to_owned(), f64::from(difficulty.max_combo()));
        if let PerformanceAttributes::Osu(osu) = attrs {
            attributes.insert(AIM_PP.to_owned(), osu.pp_aim);
            attributes.insert(SPEED_PP.to_owned(), osu.pp_speed);
            attributes.insert(ACCURACY_PP.to_owned(), osu.pp_acc);
            attributes.insert(FLASHLIGHT_PP.to_owned(), osu.pp_flashlight);
            attributes.insert(EFFECTIVE_MISS_COUNT.to_owned(), osu.effective_miss_count);
        }

        Ok(PerformanceRating { pp, attributes })
    }
}
