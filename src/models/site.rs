use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Job boards the aggregation backend can scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Indeed,
    Glassdoor,
    Linkedin,
}

impl Site {
    pub const ALL: [Site; 3] = [Site::Indeed, Site::Glassdoor, Site::Linkedin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Site::Indeed => "indeed",
            Site::Glassdoor => "glassdoor",
            Site::Linkedin => "linkedin",
        }
    }

    /// Indeed and Glassdoor are scoped by country rather than free-text location.
    pub fn uses_country(&self) -> bool {
        matches!(self, Site::Indeed | Site::Glassdoor)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Site {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Site::ALL
            .into_iter()
            .find(|site| site.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                AppError::Config(format!(
                    "Unsupported site '{name}' (expected one of indeed, glassdoor, linkedin)"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("LinkedIn".parse::<Site>().unwrap(), Site::Linkedin);
        assert_eq!(" indeed ".parse::<Site>().unwrap(), Site::Indeed);
    }

    #[test]
    fn rejects_unknown_site_as_config_error() {
        let err = "monster".parse::<Site>().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("monster"));
    }
}
