use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::AppError;
use crate::models::listing::posting_key;
use crate::models::{Listing, Site};

/// One row of the sent-jobs ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub identifier: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
    pub url: Option<String>,
    pub site: Site,
    #[serde(default)]
    pub notified_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    fn from_listing(listing: &Listing, notified_at: DateTime<Utc>) -> Self {
        Self {
            identifier: listing.id.clone(),
            title: listing.title.clone(),
            company: listing.company.clone(),
            location: listing.location.clone(),
            date: listing.date_posted,
            url: listing.url.clone(),
            site: listing.site,
            notified_at: Some(notified_at),
        }
    }
}

/// Append-only record of listings that have already been notified.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    entries: Vec<LedgerEntry>,
    seen: HashSet<String>,
    postings: HashSet<String>,
}

impl Ledger {
    /// Read the ledger file fully. A missing file is an empty ledger; a file
    /// that exists but cannot be parsed is an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();

        let entries = match File::open(&path) {
            Ok(file) => read_entries(file, &path)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("No ledger at {}, starting empty", path.display());
                Vec::new()
            }
            Err(e) => {
                return Err(AppError::Ledger(format!(
                    "Failed to open {}: {e}",
                    path.display()
                )));
            }
        };

        let seen = entries.iter().map(|e| e.identifier.clone()).collect();
        let postings = entries
            .iter()
            .map(|e| posting_key(&e.title, &e.company))
            .collect();
        Ok(Self {
            path,
            entries,
            seen,
            postings,
        })
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// Candidates not yet in the ledger, in input order.
    ///
    /// A candidate is known when its identifier or its title/company posting
    /// key was recorded before, so the same posting listed on another board
    /// is not sent twice. Within the batch only the first occurrence of either
    /// key is returned.
    pub fn diff(&self, candidates: &[Listing]) -> Vec<Listing> {
        let mut batch_ids = HashSet::new();
        let mut batch_postings = HashSet::new();
        candidates
            .iter()
            .filter(|l| {
                let key = l.posting_key();
                !self.seen.contains(&l.id)
                    && !self.postings.contains(&key)
                    && batch_ids.insert(l.id.as_str())
                    && batch_postings.insert(key)
            })
            .cloned()
            .collect()
    }

    /// Record listings as notified and durably rewrite the ledger file.
    /// Returns how many new identifiers were added.
    pub fn commit(&mut self, listings: &[Listing]) -> Result<usize, AppError> {
        let now = Utc::now();
        let fresh: Vec<LedgerEntry> = self
            .diff(listings)
            .iter()
            .map(|l| LedgerEntry::from_listing(l, now))
            .collect();

        if fresh.is_empty() {
            return Ok(0);
        }

        let mut all = self.entries.clone();
        all.extend(fresh.iter().cloned());
        write_atomic(&self.path, &all)?;

        let added = fresh.len();
        self.seen.extend(fresh.iter().map(|e| e.identifier.clone()));
        self.postings
            .extend(fresh.iter().map(|e| posting_key(&e.title, &e.company)));
        self.entries = all;
        tracing::info!(
            "Updated ledger {} with {added} entries ({} total)",
            self.path.display(),
            self.entries.len()
        );
        Ok(added)
    }
}

fn read_entries(file: File, path: &Path) -> Result<Vec<LedgerEntry>, AppError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    reader
        .deserialize()
        .collect::<Result<Vec<LedgerEntry>, _>>()
        .map_err(|e| AppError::Ledger(format!("Corrupt ledger {}: {e}", path.display())))
}

/// Write to a temp file next to the target, fsync, then rename over it.
fn write_atomic(path: &Path, entries: &[LedgerEntry]) -> Result<(), AppError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let err = |e: &dyn std::fmt::Display| {
        AppError::Ledger(format!("Failed to write {}: {e}", path.display()))
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| err(&e))?;
    {
        let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
        for entry in entries {
            writer.serialize(entry).map_err(|e| err(&e))?;
        }
        writer.flush().map_err(|e| err(&e))?;
    }
    // Keep the existing ledger's mode instead of the temp file's 0600.
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| err(&e))?;
    }
    tmp.as_file().sync_all().map_err(|e| err(&e))?;
    tmp.persist(path).map_err(|e| err(&e.error))?;

    // Make the rename itself durable where the platform allows it.
    #[cfg(unix)]
    if let Ok(d) = File::open(dir) {
        let _ = d.sync_all();
    }

    Ok(())
}
