use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::collectors::{ListingSource, parse_results, search_params};
use crate::error::AppError;
use crate::models::{Listing, SearchSpec};

const SEARCH_PATH: &str = "/api/v1/search_jobs";

/// Client for a JobSpy REST service.
pub struct JobSpyApi {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl JobSpyApi {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout_secs,
        })
    }
}

#[async_trait]
impl ListingSource for JobSpyApi {
    fn name(&self) -> &str {
        "jobspy-api"
    }

    async fn fetch(&self, spec: &SearchSpec) -> Result<Vec<Listing>, AppError> {
        let url = format!("{}{SEARCH_PATH}", self.base_url);
        tracing::info!("Scraping {} for '{}' in {}", spec.site, spec.term, spec.location);

        let mut req = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&search_params(spec));
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Fetch(format!("JobSpy request timed out after {}s", self.timeout_secs))
                } else {
                    AppError::Fetch(format!("JobSpy request failed: {e}"))
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Fetch(format!("JobSpy returned {status}: {body}")));
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| AppError::Fetch(format!("Failed to parse response: {e}")))?;

        parse_results(&data, spec)
    }
}
