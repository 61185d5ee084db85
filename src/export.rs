use std::path::Path;

use crate::error::AppError;
use crate::models::Listing;

pub const FILTERED_FILE: &str = "jobs.csv";
pub const ALL_FILE: &str = "all_jobs.csv";

/// Write this run's filtered and raw listings as CSV snapshots.
pub fn write_snapshots(dir: &Path, filtered: &[Listing], all: &[Listing]) -> Result<(), AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::Export(format!("Failed to create {}: {e}", dir.display())))?;
    write_listings(&dir.join(FILTERED_FILE), filtered)?;
    write_listings(&dir.join(ALL_FILE), all)?;
    tracing::info!(
        "Saved {} filtered and {} total jobs to {}",
        filtered.len(),
        all.len(),
        dir.display()
    );
    Ok(())
}

fn write_listings(path: &Path, listings: &[Listing]) -> Result<(), AppError> {
    let err = |e: csv::Error| AppError::Export(format!("Failed to write {}: {e}", path.display()));
    let mut writer = csv::Writer::from_path(path).map_err(err)?;
    for listing in listings {
        writer.serialize(listing).map_err(err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::Export(format!("Failed to write {}: {e}", path.display())))
}
