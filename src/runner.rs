use std::collections::HashSet;
use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};

use crate::collectors::ListingSource;
use crate::config::Settings;
use crate::error::AppError;
use crate::export;
use crate::filter;
use crate::ledger::Ledger;
use crate::models::Listing;
use crate::notify::Notifier;

/// Counters for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub specs_total: usize,
    pub specs_failed: usize,
    pub fetched: usize,
    pub kept: usize,
    pub new: usize,
    pub delivered: usize,
    pub delivery_failures: usize,
    pub committed: usize,
}

/// Run every search spec through fetch, filter, dedup and notify, then commit
/// the delivered listings to the ledger.
///
/// Only listings the notifier confirmed are committed, once, after all specs.
/// A crash before the commit means those listings are sent again next run;
/// a failed delivery is never recorded and is retried next run.
pub async fn run(
    settings: &Settings,
    source: &dyn ListingSource,
    notifier: &dyn Notifier,
    ledger: &mut Ledger,
    today: NaiveDate,
) -> Result<RunReport, AppError> {
    let started = Instant::now();
    let mut report = RunReport {
        specs_total: settings.specs.len(),
        ..Default::default()
    };

    tracing::info!(
        "Starting run: {} searches via {}, ledger has {} entries",
        report.specs_total,
        source.name(),
        ledger.len()
    );

    // Identifiers and title/company keys already tried this run.
    let mut attempted: HashSet<String> = HashSet::new();
    let mut attempted_postings: HashSet<String> = HashSet::new();
    let mut delivered: Vec<Listing> = Vec::new();
    let mut all_raw: Vec<Listing> = Vec::new();
    let mut all_kept: Vec<Listing> = Vec::new();

    for (i, spec) in settings.specs.iter().enumerate() {
        if i > 0 && !settings.request_delay.is_zero() {
            tokio::time::sleep(settings.request_delay).await;
        }

        let raw = match source.fetch(spec).await {
            Ok(listings) => listings,
            Err(e) => {
                tracing::error!("Error scraping {} for '{}': {e}", spec.site, spec.term);
                report.specs_failed += 1;
                continue;
            }
        };
        if raw.is_empty() {
            tracing::warn!("No results found for '{}' on {}", spec.term, spec.site);
            continue;
        }
        report.fetched += raw.len();
        if settings.export_dir.is_some() {
            all_raw.extend(raw.iter().cloned());
        }

        let total = raw.len();
        let (kept, stats) = filter::apply(raw, &settings.filter, today);
        tracing::debug!(
            too_old = stats.too_old,
            language = stats.language,
            excluded = stats.excluded,
            "Filtered '{}' on {} from {total} to {} jobs",
            spec.term,
            spec.site,
            kept.len()
        );
        report.kept += kept.len();

        let new: Vec<Listing> = ledger
            .diff(&kept)
            .into_iter()
            .filter(|l| {
                let key = l.posting_key();
                if attempted.contains(&l.id) || attempted_postings.contains(&key) {
                    return false;
                }
                attempted.insert(l.id.clone());
                attempted_postings.insert(key);
                true
            })
            .collect();
        if settings.export_dir.is_some() {
            all_kept.extend(kept);
        }
        report.new += new.len();

        for listing in new {
            match notifier.send(&listing).await {
                Ok(()) => {
                    report.delivered += 1;
                    delivered.push(listing);
                }
                Err(e) => {
                    tracing::warn!("Failed to send '{}' ({}): {e}", listing.title, listing.id);
                    report.delivery_failures += 1;
                }
            }
        }
    }

    if report.specs_total > 0 && report.specs_failed == report.specs_total {
        return Err(AppError::Fetch(format!(
            "All {} searches failed",
            report.specs_total
        )));
    }

    if let Some(dir) = &settings.export_dir
        && let Err(e) = export::write_snapshots(dir, &all_kept, &all_raw)
    {
        tracing::warn!("{e}");
    }

    report.committed = ledger.commit(&delivered)?;

    tracing::info!(
        "Run completed in {:.2}s: {} searches ({} failed), {} fetched, {} kept, {} new, {} sent, {} send failures",
        started.elapsed().as_secs_f64(),
        report.specs_total,
        report.specs_failed,
        report.fetched,
        report.kept,
        report.new,
        report.delivered,
        report.delivery_failures
    );

    Ok(report)
}

/// Text of the optional startup check message.
pub fn startup_message(settings: &Settings, now: DateTime<Utc>) -> String {
    let sites: Vec<&str> = settings.sites.iter().map(|s| s.as_str()).collect();
    format!(
        "<b>Job Scraper System Test</b>\n\n\
         ✅ This is a test message from the job scraper system.\n\
         🕒 System time: {}\n\
         🔍 Search terms: {} terms configured\n\
         🌐 Sites: {}",
        now.format("%Y-%m-%d %H:%M:%S UTC"),
        settings.search_terms.len(),
        sites.join(", ")
    )
}
