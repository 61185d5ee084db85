use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::Notifier;
use crate::error::AppError;
use crate::models::Listing;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram's hard limit on message text.
pub const MAX_MESSAGE_LENGTH: usize = 4096;
const TRUNCATION_MARKER: &str = "…\n\n[Message truncated]";
/// Cap on any single field so truncation never splits an HTML tag.
const MAX_FIELD_LENGTH: usize = 512;

#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    token: String,
    chat_id: String,
    timeout_secs: u64,
}

impl TelegramNotifier {
    pub fn new(
        api_base: &str,
        token: String,
        chat_id: String,
        timeout_secs: u64,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
            chat_id,
            timeout_secs,
        })
    }

    /// Send a plain status message, e.g. the startup check.
    pub async fn send_status(&self, text: &str) -> Result<(), AppError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text: truncate(text),
            parse_mode: "HTML",
            disable_web_page_preview: true,
            reply_markup: None,
        };
        self.post(&payload).await
    }

    async fn post(&self, payload: &SendMessage<'_>) -> Result<(), AppError> {
        // The token is part of the path, so never log this URL.
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);

        let resp = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Delivery(format!(
                        "Telegram request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    AppError::Delivery(format!("Telegram request failed: {}", e.without_url()))
                }
            })?;

        let status = resp.status();
        let body: ApiResponse = resp.json().await.unwrap_or_default();

        if !status.is_success() || !body.ok {
            let reason = body.description.unwrap_or_else(|| "no description".to_string());
            return Err(AppError::Delivery(format!(
                "Telegram returned {status}: {reason}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, listing: &Listing) -> Result<(), AppError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text: format_listing(listing),
            parse_mode: "HTML",
            disable_web_page_preview: false,
            reply_markup: Some(job_keyboard(listing)),
        };
        self.post(&payload).await
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
}

#[derive(Deserialize, Default)]
struct ApiResponse {
    #[serde(default)]
    ok: bool,
    description: Option<String>,
}

fn escape(s: &str) -> String {
    let clipped: String = s.chars().take(MAX_FIELD_LENGTH).collect();
    html_escape::encode_text(&clipped).to_string()
}

/// Render a listing as Telegram HTML.
pub fn format_listing(listing: &Listing) -> String {
    let mut parts = vec![
        format!("<b>{}</b>", escape(&listing.title)),
        format!("🏢 <b>{}</b>", escape(&listing.company)),
    ];

    if let Some(location) = &listing.location {
        parts.push(format!("📍 {}", escape(location)));
    }

    let mut details = Vec::new();
    if let Some(job_type) = &listing.job_type {
        details.push(escape(job_type));
    }
    if let Some(date) = listing.date_posted {
        details.push(format!("Posted: {}", date.format("%Y-%m-%d")));
    }
    if !details.is_empty() {
        parts.push(details.join(" | "));
    }

    parts.push(format!(
        "🔍 Search term: <code>{}</code>",
        escape(&listing.search_term)
    ));
    parts.push(format!("Source: {}", listing.site));

    truncate(&parts.join("\n"))
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_LENGTH {
        return text.to_string();
    }
    let keep = MAX_MESSAGE_LENGTH - TRUNCATION_MARKER.chars().count();
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

/// Short stable hash of a listing id for callback data (Telegram caps it at 64 bytes).
pub fn callback_key(id: &str) -> String {
    let digest = Sha256::digest(id.as_bytes());
    hex::encode(&digest[..8])
}

/// Link button to the posting plus the save / interested / applied actions.
pub fn job_keyboard(listing: &Listing) -> InlineKeyboardMarkup {
    let key = callback_key(&listing.id);
    let action = |text: &str, prefix: &str| InlineKeyboardButton {
        text: text.to_string(),
        url: None,
        callback_data: Some(format!("{prefix}_{key}")),
    };

    let mut rows = Vec::new();
    if let Some(url) = &listing.url {
        rows.push(vec![InlineKeyboardButton {
            text: "🔗 View Job Posting".to_string(),
            url: Some(url.clone()),
            callback_data: None,
        }]);
    }
    rows.push(vec![
        action("💾 Save", "save"),
        action("👍 Interested", "interested"),
        action("✅ Applied", "applied"),
    ]);

    InlineKeyboardMarkup {
        inline_keyboard: rows,
    }
}
