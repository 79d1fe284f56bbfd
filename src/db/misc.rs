use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;

/// 100ns ticks since 1601-01-01, the clock osu! stamps loose replay files with.
pub fn windows_ticks(timestamp: DateTime<Utc>) -> u64 {
    let Some(start_epoch) = Utc.with_ymd_and_hms(1601, 1, 1, 0, 0, 0).single() else {
        return 0;
    };
    let delta = timestamp.signed_duration_since(start_epoch);
    let secs = delta.num_seconds().max(0) as u64;
    let sub_ticks = (delta.subsec_nanos().max(0) as u64) / 100;
    secs * 10_000_000 + sub_ticks
}

/// Name osu! gives a loose replay file in `Data/r`.
#[cfg(test)]
pub(crate) fn get_replay_file_name(timestamp: DateTime<Utc>, hash: &str) -> String {
    format!("{}-{}.osr", hash, windows_ticks(timestamp))
}

/// Extracts the tick stamp from a `<hash>-<ticks>.osr` file name.
pub fn replay_file_ticks(path: &Path) -> Option<u64> {
    if path.extension()?.to_str()? != "osr" {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .rsplit('-')
        .next()?
        .parse::<u64>()
        .ok()
}

/// File name of the beatmap without its extension.
pub fn map_display_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
