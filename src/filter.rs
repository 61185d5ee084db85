use chrono::NaiveDate;
use whatlang::Lang;

use crate::models::Listing;

/// Filtering rules for one run.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub max_age_days: u32,
    pub languages: Vec<Lang>,
    pub excluded_terms: Vec<String>,
}

/// Why a listing was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooOld,
    Language,
    ExcludedTerm,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterStats {
    pub too_old: usize,
    pub language: usize,
    pub excluded: usize,
}

impl FilterConfig {
    /// Check one listing against the rules, in order: age, language, excluded terms.
    pub fn check(&self, listing: &Listing, today: NaiveDate) -> Result<(), Rejection> {
        if !self.is_recent(listing, today) {
            return Err(Rejection::TooOld);
        }
        if !self.language_matches(listing) {
            return Err(Rejection::Language);
        }
        if self.has_excluded_term(listing) {
            return Err(Rejection::ExcludedTerm);
        }
        Ok(())
    }

    /// A listing without a date cannot be shown to be recent.
    fn is_recent(&self, listing: &Listing, today: NaiveDate) -> bool {
        match listing.date_posted {
            Some(posted) => (today - posted).num_days() <= i64::from(self.max_age_days),
            None => false,
        }
    }

    fn language_matches(&self, listing: &Listing) -> bool {
        let sample = listing.language_sample();
        if sample.is_empty() {
            return false;
        }
        match whatlang::detect(sample) {
            Some(info) => self.languages.contains(&info.lang()),
            None => false,
        }
    }

    fn has_excluded_term(&self, listing: &Listing) -> bool {
        let title = listing.title.to_lowercase();
        let description = listing
            .description
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default();
        self.excluded_terms
            .iter()
            .map(|t| t.to_lowercase())
            .filter(|t| !t.is_empty())
            .any(|t| title.contains(&t) || description.contains(&t))
    }
}

/// Apply the filter rules, preserving input order.
pub fn apply(
    listings: Vec<Listing>,
    config: &FilterConfig,
    today: NaiveDate,
) -> (Vec<Listing>, FilterStats) {
    let mut stats = FilterStats::default();
    let mut kept = Vec::with_capacity(listings.len());

    for listing in listings {
        match config.check(&listing, today) {
            Ok(()) => kept.push(listing),
            Err(Rejection::TooOld) => stats.too_old += 1,
            Err(Rejection::Language) => stats.language += 1,
            Err(Rejection::ExcludedTerm) => stats.excluded += 1,
        }
    }

    (kept, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewListing, Site};

    const ENGLISH: &str = "We are looking for an experienced engineer to join our growing team. \
        You will design and build data pipelines, work closely with product managers, \
        and help our customers get the most out of their information every single day.";

    const DUTCH: &str = "Wij zijn op zoek naar een ervaren ontwikkelaar die ons team komt versterken. \
        Je werkt aan nieuwe toepassingen voor onze klanten en denkt mee over de \
        technische keuzes die wij samen maken in een prettige werkomgeving.";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn config() -> FilterConfig {
        FilterConfig {
            max_age_days: 7,
            languages: vec![Lang::Eng],
            excluded_terms: vec!["Intern".into()],
        }
    }

    fn listing(title: &str, days_old: i64, description: &str) -> Listing {
        Listing::new(
            NewListing {
                title: title.into(),
                company: "Acme".into(),
                date_posted: Some(today() - chrono::Duration::days(days_old)),
                description: Some(description.into()),
                url: Some(format!("https://acme.test/{title}/{days_old}")),
                ..Default::default()
            },
            Site::Indeed,
            "python",
        )
    }

    #[test]
    fn age_boundary_is_inclusive() {
        let cfg = config();
        assert_eq!(cfg.check(&listing("Engineer", 7, ENGLISH), today()), Ok(()));
        assert_eq!(
            cfg.check(&listing("Engineer", 8, ENGLISH), today()),
            Err(Rejection::TooOld)
        );
    }

    #[test]
    fn missing_date_is_dropped() {
        let mut l = listing("Engineer", 0, ENGLISH);
        l.date_posted = None;
        assert_eq!(config().check(&l, today()), Err(Rejection::TooOld));
    }

    #[test]
    fn non_target_language_is_dropped() {
        assert_eq!(
            config().check(&listing("Ontwikkelaar", 1, DUTCH), today()),
            Err(Rejection::Language)
        );
    }

    #[test]
    fn empty_text_fails_detection() {
        let mut l = listing("Engineer", 1, "");
        l.title = "   ".into();
        assert_eq!(config().check(&l, today()), Err(Rejection::Language));
    }

    #[test]
    fn excluded_term_matches_any_case() {
        let cfg = config();
        for title in ["Software Intern", "SOFTWARE INTERN", "software intern"] {
            assert_eq!(
                cfg.check(&listing(title, 1, ENGLISH), today()),
                Err(Rejection::ExcludedTerm),
                "{title}"
            );
        }
    }

    #[test]
    fn excluded_term_in_description() {
        let desc = format!("{ENGLISH} This is an internship position.");
        assert_eq!(
            config().check(&listing("Engineer", 1, &desc), today()),
            Err(Rejection::ExcludedTerm)
        );
    }

    #[test]
    fn apply_preserves_order_and_counts() {
        let input = vec![
            listing("First", 1, ENGLISH),
            listing("Old", 30, ENGLISH),
            listing("Second", 2, ENGLISH),
            listing("Marketing Intern", 2, ENGLISH),
            listing("Third", 0, ENGLISH),
            listing("Ontwikkelaar", 1, DUTCH),
        ];
        let (kept, stats) = apply(input, &config(), today());
        let titles: Vec<_> = kept.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
        assert_eq!(
            stats,
            FilterStats {
                too_old: 1,
                language: 1,
                excluded: 1
            }
        );
    }

    #[test]
    fn everything_older_than_max_age_is_excluded() {
        let cfg = config();
        for days in 8..60 {
            let (kept, _) = apply(vec![listing("Engineer", days, ENGLISH)], &cfg, today());
            assert!(kept.is_empty(), "{days} days old was kept");
        }
    }
}
