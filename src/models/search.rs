use crate::models::site::Site;

/// One (term, site) query unit for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpec {
    pub term: String,
    pub site: Site,
    pub location: String,
    pub max_results: u32,
    pub max_age_days: u32,
}

impl SearchSpec {
    pub fn hours_old(&self) -> u32 {
        self.max_age_days.saturating_mul(24)
    }
}

/// Cross product of terms and sites, term-major, in configured order.
pub fn expand(
    terms: &[String],
    sites: &[Site],
    location: &str,
    max_results: u32,
    max_age_days: u32,
) -> Vec<SearchSpec> {
    terms
        .iter()
        .flat_map(|term| {
            sites.iter().map(move |&site| SearchSpec {
                term: term.clone(),
                site,
                location: location.to_string(),
                max_results,
                max_age_days,
            })
        })
        .collect()
}
