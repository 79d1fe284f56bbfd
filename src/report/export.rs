use chrono::Local;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::calc::RecalculatedScore;
use crate::config::SortKey;
use crate::error::Result;
use crate::ranking::RankedReport;

#[derive(Serialize)]
struct ExportData<'a> {
    generated_time: String,
    sort_key: String,
    local_pp: f64,
    weighted_total: f64,
    bonus: f64,
    total_entries: usize,
    entries: &'a [RecalculatedScore],
}

/// Writes the ranked report as pretty-printed JSON to `path`.
pub fn export_json(report: &RankedReport, sort_key: &SortKey, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let data = ExportData {
        generated_time: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        sort_key: sort_key.to_string(),
        local_pp: report.local_pp(),
        weighted_total: report.weighted_total,
        bonus: report.bonus,
        total_entries: report.total_entries,
        entries: &report.entries,
    };

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &data)?;
    writer.flush()?;

    log::info!("exported report to {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::{LegacyMods, ScoreSnapshot};
    use chrono::Utc;
    use std::collections::BTreeMap;

    #[test]
    fn writes_entries_and_totals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.json");
        let report = RankedReport {
            entries: vec![RecalculatedScore {
                checksum: "c1".into(),
                map_name: "map".into(),
                player: "me".into(),
                timestamp: Utc::now(),
                pp: 150.0,
                attributes: BTreeMap::from([("Aim pp".to_owned(), 70.0)]),
                score: ScoreSnapshot {
                    accuracy: 0.99,
                    max_combo: 10,
                    map_max_combo: 10,
                    count_great: 10,
                    count_good: 0,
                    count_meh: 0,
                    count_miss: 0,
                    mods: LegacyMods::from_bits(1 << 3),
                },
            }],
            total_entries: 1,
            weighted_total: 150.0,
            bonus: 0.25,
        };

        let written = export_json(&report, &SortKey::Rating, &path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(written).unwrap()).unwrap();

        assert_eq!(value["sort_key"], "pp");
        assert_eq!(value["local_pp"], 150.25);
        assert_eq!(value["entries"][0]["checksum"], "c1");
        assert_eq!(value["entries"][0]["score"]["mods"][0], "HD");
        assert_eq!(value["entries"][0]["attributes"]["Aim pp"], 70.0);
    }
}
