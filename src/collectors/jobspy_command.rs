use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::collectors::{ListingSource, parse_results, search_params};
use crate::error::AppError;
use crate::models::{Listing, SearchSpec};

/// Shells out to an external scraper program (e.g. a small JobSpy wrapper
/// script) that prints the results as JSON on stdout.
///
/// Search parameters are appended to the configured args as `--name value`.
pub struct JobSpyCommand {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl JobSpyCommand {
    pub fn new(program: &str, args: Vec<String>, timeout_secs: u64) -> Self {
        Self {
            program: program.to_string(),
            args,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn command_args(&self, spec: &SearchSpec) -> Vec<String> {
        let mut args = self.args.clone();
        for (name, value) in search_params(spec) {
            args.push(format!("--{name}"));
            args.push(value);
        }
        args
    }
}

#[async_trait]
impl ListingSource for JobSpyCommand {
    fn name(&self) -> &str {
        &self.program
    }

    async fn fetch(&self, spec: &SearchSpec) -> Result<Vec<Listing>, AppError> {
        tracing::info!("Scraping {} for '{}' in {}", spec.site, spec.term, spec.location);

        let run = tokio::process::Command::new(&self.program)
            .args(self.command_args(spec))
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                AppError::Fetch(format!(
                    "{} timed out after {}s",
                    self.program,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| AppError::Fetch(format!("Failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Fetch(format!(
                "{} failed: {}",
                self.program,
                stderr.trim()
            )));
        }

        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let data: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| AppError::Fetch(format!("Failed to parse {} output: {e}", self.program)))?;

        parse_results(&data, spec)
    }
}
