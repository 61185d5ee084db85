// Listing sources. Each backend talks to a JobSpy-compatible aggregator and
// returns normalized listings for one search spec.

pub mod jobspy_api;
pub mod jobspy_command;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use crate::config::SourceSettings;
use crate::error::AppError;
use crate::models::{Listing, NewListing, SearchSpec, Site};

pub use jobspy_api::JobSpyApi;
pub use jobspy_command::JobSpyCommand;

/// Trait that all listing sources must implement.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Fetch listings for one (term, site) spec. An empty result is not an error.
    async fn fetch(&self, spec: &SearchSpec) -> Result<Vec<Listing>, AppError>;
}

/// Build the configured source backend.
pub fn build_source(
    settings: &SourceSettings,
    timeout_secs: u64,
) -> Result<Box<dyn ListingSource>, AppError> {
    match settings {
        SourceSettings::Api { base_url, api_key } => Ok(Box::new(JobSpyApi::new(
            base_url,
            api_key.clone(),
            timeout_secs,
        )?)),
        SourceSettings::Command { program, args } => Ok(Box::new(JobSpyCommand::new(
            program,
            args.clone(),
            timeout_secs,
        ))),
    }
}

/// Query parameters shared by every backend, in JobSpy's naming.
pub(crate) fn search_params(spec: &SearchSpec) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("site_name", spec.site.to_string()),
        ("search_term", spec.term.clone()),
        ("location", spec.location.clone()),
        ("results_wanted", spec.max_results.to_string()),
        ("hours_old", spec.hours_old().to_string()),
        (
            "linkedin_fetch_description",
            (spec.site == Site::Linkedin).to_string(),
        ),
    ];
    if spec.site.uses_country() {
        params.push(("country_indeed", spec.location.clone()));
    }
    params
}

/// Parse a JobSpy payload: either `{"jobs": [...]}` or a bare array.
pub(crate) fn parse_results(data: &Value, spec: &SearchSpec) -> Result<Vec<Listing>, AppError> {
    let jobs = data
        .get("jobs")
        .and_then(|v| v.as_array())
        .or_else(|| data.as_array())
        .ok_or_else(|| AppError::Fetch("Missing 'jobs' in response".to_string()))?;

    let total = jobs.len();
    let listings: Vec<Listing> = jobs.iter().filter_map(|raw| parse_job(raw, spec)).collect();
    if listings.len() < total {
        tracing::debug!(
            "Skipped {} malformed records for '{}' on {}",
            total - listings.len(),
            spec.term,
            spec.site
        );
    }
    Ok(listings)
}

/// Normalize a single JobSpy record. Records without a title are skipped.
fn parse_job(raw: &Value, spec: &SearchSpec) -> Option<Listing> {
    let title = non_blank(raw.get("title"))?;

    let company = non_blank(raw.get("company")).unwrap_or_else(|| "Unknown".to_string());

    let url = non_blank(raw.get("job_url")).or_else(|| non_blank(raw.get("job_url_direct")));

    let input = NewListing {
        title,
        company,
        location: raw.get("location").and_then(parse_location),
        date_posted: raw.get("date_posted").and_then(parse_date),
        description: non_blank(raw.get("description")),
        url,
        job_type: non_blank(raw.get("job_type")),
    };

    Some(Listing::new(input, spec.site, &spec.term))
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    value
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Location is either a plain string or a `{city, state, country}` object.
fn parse_location(value: &Value) -> Option<String> {
    if let Some(obj) = value.as_object() {
        let parts: Vec<String> = ["city", "state", "country"]
            .iter()
            .filter_map(|k| non_blank(obj.get(*k)))
            .collect();
        return (!parts.is_empty()).then(|| parts.join(", "));
    }
    non_blank(Some(value))
}

/// Accepts `YYYY-MM-DD`, RFC 3339, or epoch milliseconds.
fn parse_date(value: &Value) -> Option<NaiveDate> {
    if let Some(ms) = value.as_i64() {
        return DateTime::from_timestamp_millis(ms).map(|dt| dt.date_naive());
    }
    let s = value.as_str()?.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| s.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}
