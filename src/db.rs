mod catalog;
mod misc;
mod replays;

pub use catalog::{CatalogIndex, load_catalog};
pub use misc::{map_display_name, replay_file_ticks, windows_ticks};
pub use replays::{ReplayStore, load_replays};

use crate::calc::LegacyMods;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Submission state of a beatmap as recorded in osu!.db.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubmissionStatus {
    Unknown,
    Unsubmitted,
    Pending,
    Ranked,
    Approved,
    Qualified,
    Loved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameMode {
    Standard,
    Taiko,
    Catch,
    Mania,
}

/// One beatmap row of the catalog database.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub checksum: Option<String>,
    pub folder_name: Option<String>,
    pub file_name: Option<String>,
    pub status: SubmissionStatus,
}

/// One recorded attempt from scores.db (or a loose replay file).
#[derive(Debug, Clone, Serialize)]
pub struct ReplayRecord {
    pub player: String,
    pub mode: GameMode,
    pub count_300: u32,
    pub count_100: u32,
    pub count_50: u32,
    pub count_miss: u32,
    pub max_combo: u32,
    pub mods: LegacyMods,
    pub timestamp: DateTime<Utc>,
}

impl From<osu_db::Mode> for GameMode {
    fn from(mode: osu_db::Mode) -> Self {
        match mode {
            osu_db::Mode::Standard => GameMode::Standard,
            osu_db::Mode::Taiko => GameMode::Taiko,
            osu_db::Mode::CatchTheBeat => GameMode::Catch,
            osu_db::Mode::Mania => GameMode::Mania,
        }
    }
}

impl ReplayRecord {
    /// Returns the beatmap checksum together with the decoded record, or `None`
    /// when the replay lacks either the checksum or the player name.
    pub fn from_replay(rep: &osu_db::Replay) -> Option<(String, ReplayRecord)> {
        let hash = rep.beatmap_hash.clone()?;
        let player = rep.player_name.clone()?;
        let record = ReplayRecord {
            player,
            mode: rep.mode.into(),
            count_300: rep.count_300 as u32,
            count_100: rep.count_100 as u32,
            count_50: rep.count_50 as u32,
            count_miss: rep.count_miss as u32,
            max_combo: rep.max_combo as u32,
            mods: LegacyMods::from(rep.mods),
            timestamp: rep.timestamp,
        };
        Some((hash, record))
    }
}
