use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::site::Site;

/// A single normalized job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub date_posted: Option<NaiveDate>,
    pub description: Option<String>,
    pub site: Site,
    pub url: Option<String>,
    pub job_type: Option<String>,
    pub search_term: String,
}

/// Fields collected from a source before the identifier is derived.
#[derive(Debug, Clone, Default)]
pub struct NewListing {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub date_posted: Option<NaiveDate>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub job_type: Option<String>,
}

impl Listing {
    pub fn new(input: NewListing, site: Site, search_term: &str) -> Self {
        let id = listing_id(
            site,
            input.url.as_deref(),
            &input.title,
            &input.company,
            input.date_posted,
        );
        Listing {
            id,
            title: input.title,
            company: input.company,
            location: input.location,
            date_posted: input.date_posted,
            description: input.description,
            site,
            url: input.url,
            job_type: input.job_type,
            search_term: search_term.to_string(),
        }
    }

    /// Text used for language detection: the description, or the title when
    /// there is no description.
    pub fn language_sample(&self) -> &str {
        match self.description.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => d,
            _ => self.title.trim(),
        }
    }

    /// Site-independent key for the posting itself. See [`posting_key`].
    pub fn posting_key(&self) -> String {
        posting_key(&self.title, &self.company)
    }
}

/// Normalized `title|company`, used to recognise the same posting when it is
/// listed on more than one board.
pub fn posting_key(title: &str, company: &str) -> String {
    let norm = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    format!("{}|{}", norm(title), norm(company))
}

/// Derive the dedup key for a posting.
///
/// Prefers `site:url`. Falls back to `site:title|company|date` with title and
/// company trimmed and lower-cased, so the same posting hashes the same way
/// across runs even when the source omits the URL.
pub fn listing_id(
    site: Site,
    url: Option<&str>,
    title: &str,
    company: &str,
    date_posted: Option<NaiveDate>,
) -> String {
    if let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) {
        return format!("{site}:{url}");
    }
    let date = date_posted
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    format!(
        "{site}:{}|{}|{date}",
        title.trim().to_lowercase(),
        company.trim().to_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(url: Option<&str>) -> NewListing {
        NewListing {
            title: "  Data Engineer ".into(),
            company: "ACME BV".into(),
            date_posted: NaiveDate::from_ymd_opt(2026, 10, 1),
            url: url.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn id_prefers_url() {
        let l = Listing::new(input(Some("https://x.test/job/1")), Site::Indeed, "rag");
        assert_eq!(l.id, "indeed:https://x.test/job/1");
    }

    #[test]
    fn id_falls_back_to_title_company_date() {
        let l = Listing::new(input(None), Site::Linkedin, "rag");
        assert_eq!(l.id, "linkedin:data engineer|acme bv|2026-10-01");

        let blank_url = Listing::new(input(Some("   ")), Site::Linkedin, "rag");
        assert_eq!(blank_url.id, l.id);
    }

    #[test]
    fn id_is_stable_across_runs() {
        let a = Listing::new(input(None), Site::Glassdoor, "llm");
        let b = Listing::new(input(None), Site::Glassdoor, "python");
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn posting_key_ignores_site_case_and_spacing() {
        let indeed = Listing::new(input(Some("https://indeed.test/1")), Site::Indeed, "rag");
        let mut other = input(Some("https://linkedin.test/9"));
        other.title = "data  engineer".into();
        other.company = "Acme BV ".into();
        let linkedin = Listing::new(other, Site::Linkedin, "rag");
        assert_ne!(indeed.id, linkedin.id);
        assert_eq!(indeed.posting_key(), "data engineer|acme bv");
        assert_eq!(indeed.posting_key(), linkedin.posting_key());
    }

    #[test]
    fn language_sample_falls_back_to_title() {
        let mut l = Listing::new(input(None), Site::Indeed, "rag");
        assert_eq!(l.language_sample(), "Data Engineer");
        l.description = Some("Build pipelines".into());
        assert_eq!(l.language_sample(), "Build pipelines");
    }
}
