use osu_db::Listing;
use osu_db::listing::RankedStatus;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::db::{CatalogEntry, SubmissionStatus};
use crate::error::{Error, Result};

/// Lookup from beatmap checksum to the `.osu` file inside the Songs folder.
///
/// Only ranked beatmaps with a checksum are indexed. Built once before any
/// worker starts and never mutated afterwards.
#[derive(Debug, Default)]
pub struct CatalogIndex {
    paths: HashMap<String, PathBuf>,
    duplicates: usize,
}

impl CatalogIndex {
    pub fn build<'a, I>(entries: I, songs_dir: &Path) -> Self
    where
        I: IntoIterator<Item = &'a CatalogEntry>,
    {
        let mut index = CatalogIndex::default();

        for entry in entries {
            if entry.status != SubmissionStatus::Ranked {
                continue;
            }
            let Some(checksum) = entry.checksum.as_deref() else {
                continue;
            };
            let folder = entry.folder_name.as_deref().unwrap_or_default();
            let file = entry.file_name.as_deref().unwrap_or_default();

            if index.paths.contains_key(checksum) {
                log::warn!("beatmap {file} found multiple times in osu db");
                index.duplicates += 1;
                continue;
            }
            index
                .paths
                .insert(checksum.to_owned(), songs_dir.join(folder).join(file));
        }

        log::debug!("indexed {} ranked beatmaps", index.paths.len());
        index
    }

    pub fn resolve(&self, checksum: &str) -> Option<&Path> {
        self.paths.get(checksum).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Number of checksums that were seen again after their first mapping.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

impl From<RankedStatus> for SubmissionStatus {
    fn from(status: RankedStatus) -> Self {
        match status {
            RankedStatus::Unknown => SubmissionStatus::Unknown,
            RankedStatus::Unsubmitted => SubmissionStatus::Unsubmitted,
            RankedStatus::PendingWipGraveyard => SubmissionStatus::Pending,
            RankedStatus::Ranked => SubmissionStatus::Ranked,
            RankedStatus::Approved => SubmissionStatus::Approved,
            RankedStatus::Qualified => SubmissionStatus::Qualified,
            RankedStatus::Loved => SubmissionStatus::Loved,
        }
    }
}

/// Reads osu!.db and returns every beatmap row in file order.
pub fn load_catalog(osu_db_path: &Path) -> Result<Vec<CatalogEntry>> {
    let listing = Listing::from_file(osu_db_path).map_err(|e| Error::Database {
        path: osu_db_path.to_path_buf(),
        source: e.into(),
    })?;
    log::info!(
        "read {} beatmaps from {}",
        listing.beatmaps.len(),
        osu_db_path.display()
    );

    Ok(listing
        .beatmaps
        .into_iter()
        .map(|b| CatalogEntry {
            checksum: b.hash,
            folder_name: b.folder_name,
            file_name: b.file_name,
            status: b.status.into(),
        })
        .collect())
}
