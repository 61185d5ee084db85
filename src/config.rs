use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use whatlang::Lang;

use crate::error::AppError;
use crate::filter::FilterConfig;
use crate::models::{SearchSpec, Site, search};
use crate::notify::telegram::DEFAULT_API_BASE;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "jobzoeker",
    about = "Scrape job boards and push new matches to Telegram"
)]
pub struct Cli {
    /// Path to the TOML run configuration
    #[arg(long, env = "JOBZOEKER_CONFIG", default_value = "jobzoeker.toml")]
    pub config: PathBuf,

    /// CSV ledger of listings that were already sent
    #[arg(long, env = "LEDGER_PATH", default_value = "sent_jobs.csv")]
    pub ledger: PathBuf,

    /// Write jobs.csv / all_jobs.csv snapshots of each run here
    #[arg(long, env = "EXPORT_DIR")]
    pub export_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_bot_token: Option<String>,

    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    pub telegram_chat_id: Option<String>,

    /// Optional key for the JobSpy API (sent as x-api-key)
    #[arg(long, env = "JOBSPY_API_KEY", hide_env_values = true)]
    pub jobspy_api_key: Option<String>,
}

/// The on-disk run configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub search_terms: Vec<String>,
    pub sites: Vec<String>,
    pub location: String,
    #[serde(default = "default_results_per_search")]
    pub results_per_search: u32,
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
    #[serde(default)]
    pub excluded_terms: Vec<String>,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default)]
    pub request_delay_secs: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub send_startup_message: bool,
    pub source: SourceSettings,
    #[serde(default)]
    pub telegram: TelegramFileConfig,
}

fn default_results_per_search() -> u32 {
    40
}

fn default_max_age_days() -> u32 {
    7
}

fn default_languages() -> Vec<String> {
    vec!["eng".to_string()]
}

fn default_http_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceSettings {
    /// A JobSpy REST service.
    Api {
        base_url: String,
        #[serde(skip)]
        api_key: Option<String>,
    },
    /// An external program printing JobSpy JSON on stdout.
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramFileConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for TelegramFileConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub api_base: String,
    pub token: String,
    pub chat_id: String,
}

/// Validated, immutable configuration for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub search_terms: Vec<String>,
    pub sites: Vec<Site>,
    pub specs: Vec<SearchSpec>,
    pub filter: FilterConfig,
    pub request_delay: Duration,
    pub http_timeout_secs: u64,
    pub send_startup_message: bool,
    pub source: SourceSettings,
    pub telegram: TelegramSettings,
    pub ledger_path: PathBuf,
    pub export_dir: Option<PathBuf>,
}

impl Settings {
    /// Read the config file named on the command line and validate it.
    pub fn load(cli: &Cli) -> Result<Self, AppError> {
        let file = read_file_config(&cli.config)?;
        Self::from_parts(file, cli)
    }

    pub fn from_parts(file: FileConfig, cli: &Cli) -> Result<Self, AppError> {
        let token = required_secret(cli.telegram_bot_token.as_deref(), "TELEGRAM_BOT_TOKEN")?;
        let chat_id = required_secret(cli.telegram_chat_id.as_deref(), "TELEGRAM_CHAT_ID")?;

        let search_terms: Vec<String> = file
            .search_terms
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if search_terms.is_empty() {
            return Err(AppError::Config("No search terms configured".to_string()));
        }

        let mut sites = Vec::new();
        for name in &file.sites {
            let site: Site = name.parse()?;
            if !sites.contains(&site) {
                sites.push(site);
            }
        }
        if sites.is_empty() {
            return Err(AppError::Config("No sites configured".to_string()));
        }

        let languages = file
            .languages
            .iter()
            .map(|code| {
                Lang::from_code(code.trim().to_lowercase()).ok_or_else(|| {
                    AppError::Config(format!(
                        "Unknown language code '{code}' (expected ISO 639-3, e.g. 'eng')"
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if languages.is_empty() {
            return Err(AppError::Config("No target languages configured".to_string()));
        }

        if file.results_per_search == 0 {
            return Err(AppError::Config(
                "results_per_search must be at least 1".to_string(),
            ));
        }
        if file.http_timeout_secs == 0 {
            return Err(AppError::Config(
                "http_timeout_secs must be at least 1".to_string(),
            ));
        }

        let source = match file.source {
            SourceSettings::Api { base_url, .. } => {
                if base_url.trim().is_empty() {
                    return Err(AppError::Config("source.base_url is empty".to_string()));
                }
                SourceSettings::Api {
                    base_url,
                    api_key: cli
                        .jobspy_api_key
                        .clone()
                        .filter(|k| !k.trim().is_empty()),
                }
            }
            SourceSettings::Command { program, args } => {
                if program.trim().is_empty() {
                    return Err(AppError::Config("source.program is empty".to_string()));
                }
                SourceSettings::Command { program, args }
            }
        };

        let specs = search::expand(
            &search_terms,
            &sites,
            file.location.trim(),
            file.results_per_search,
            file.max_age_days,
        );

        Ok(Settings {
            search_terms,
            sites,
            specs,
            filter: FilterConfig {
                max_age_days: file.max_age_days,
                languages,
                excluded_terms: file
                    .excluded_terms
                    .into_iter()
                    .filter(|t| !t.trim().is_empty())
                    .collect(),
            },
            request_delay: Duration::from_secs(file.request_delay_secs),
            http_timeout_secs: file.http_timeout_secs,
            send_startup_message: file.send_startup_message,
            source,
            telegram: TelegramSettings {
                api_base: file.telegram.api_base,
                token,
                chat_id,
            },
            ledger_path: cli.ledger.clone(),
            export_dir: cli.export_dir.clone(),
        })
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("Failed to read {}: {e}", path.display())))?;
    toml::from_str(&content)
        .map_err(|e| AppError::Config(format!("Invalid config {}: {e}", path.display())))
}

fn required_secret(value: Option<&str>, name: &str) -> Result<String, AppError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| AppError::Config(format!("{name} is not set")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        search_terms = ["ai engineer", "  ", "rag"]
        sites = ["indeed", "LinkedIn", "indeed"]
        location = "Netherlands"
        excluded_terms = ["PhD", "Manager", "Intern"]

        [source]
        kind = "api"
        base_url = "http://localhost:8000"
    "#;

    fn cli() -> Cli {
        Cli {
            config: PathBuf::from("jobzoeker.toml"),
            ledger: PathBuf::from("sent_jobs.csv"),
            export_dir: None,
            log_json: false,
            telegram_bot_token: Some("123:abc".into()),
            telegram_chat_id: Some("-100200".into()),
            jobspy_api_key: None,
        }
    }

    fn file(src: &str) -> FileConfig {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn builds_specs_with_defaults() {
        let settings = Settings::from_parts(file(SAMPLE), &cli()).unwrap();
        assert_eq!(settings.search_terms, vec!["ai engineer", "rag"]);
        assert_eq!(settings.sites, vec![Site::Indeed, Site::Linkedin]);
        assert_eq!(settings.specs.len(), 4);
        assert_eq!(settings.specs[0].max_results, 40);
        assert_eq!(settings.filter.max_age_days, 7);
        assert_eq!(settings.filter.languages, vec![Lang::Eng]);
        assert_eq!(settings.http_timeout_secs, 30);
        assert_eq!(settings.telegram.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn unsupported_site_is_config_error() {
        let src = SAMPLE.replace(r#""indeed", "LinkedIn", "indeed""#, r#""indeed", "monster""#);
        let err = Settings::from_parts(file(&src), &cli()).unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.contains("monster")));
    }

    #[test]
    fn missing_credentials_are_config_errors() {
        let mut c = cli();
        c.telegram_bot_token = None;
        let err = Settings::from_parts(file(SAMPLE), &c).unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));

        let mut c = cli();
        c.telegram_chat_id = Some("   ".into());
        let err = Settings::from_parts(file(SAMPLE), &c).unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_CHAT_ID"));
    }

    #[test]
    fn unknown_language_is_config_error() {
        let src = format!("languages = [\"xx\"]\n{SAMPLE}");
        let err = Settings::from_parts(file(&src), &cli()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn command_source_parses() {
        let src = r#"
            search_terms = ["python"]
            sites = ["glassdoor"]
            location = "Netherlands"

            [source]
            kind = "command"
            program = "python3"
            args = ["scripts/jobspy_fetch.py"]
        "#;
        let settings = Settings::from_parts(file(src), &cli()).unwrap();
        assert!(matches!(
            settings.source,
            SourceSettings::Command { ref program, ref args } if program == "python3" && args.len() == 1
        ));
    }

    #[test]
    fn example_config_is_valid() {
        let src = include_str!("../config/jobzoeker.example.toml");
        let settings = Settings::from_parts(file(src), &cli()).unwrap();
        assert_eq!(settings.specs.len(), 30);
        assert_eq!(settings.request_delay, Duration::from_secs(5));
    }

    #[test]
    fn missing_config_file_is_config_error() {
        let err = read_file_config(Path::new("/nonexistent/jobzoeker.toml")).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
