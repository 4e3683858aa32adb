use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::domain::{ApplicationReference, DocumentKind, ExtractedFields};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Longest a single notification may take before it is abandoned.
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Staff-facing summary of a verified application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationNotice {
    pub reference: ApplicationReference,
    pub full_name: String,
    pub email: String,
    pub university: String,
    pub document_kind: DocumentKind,
    pub extraction: ExtractedFields,
}

impl ApplicationNotice {
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("New verified application {}", self.reference),
            format!("Name: {}", self.full_name),
            format!("Email: {}", self.email),
            format!("University: {}", self.university),
            format!("Document: {}", self.document_kind.label()),
        ];

        let extracted = [
            ("Institution", &self.extraction.institution),
            ("Qualification", &self.extraction.qualification),
            ("Graduation year", &self.extraction.graduation_year),
            ("Document number", &self.extraction.document_number),
        ];
        lines.extend(extracted.into_iter().filter_map(|(label, value)| {
            value.as_ref().map(|value| format!("{label}: {value}"))
        }));
        lines.join("\n")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("notification rejected [{status}]")]
    Rejected { status: u16 },
}

/// Outbound hook fired after a submission is verified.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, notice: &ApplicationNotice) -> Result<(), NotifyError>;
}

/// Writes notices to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, notice: &ApplicationNotice) -> Result<(), NotifyError> {
        info!(
            reference = %notice.reference,
            university = %notice.university,
            "verified application ready for follow-up"
        );
        Ok(())
    }
}

/// Sends notices to a Telegram chat through the Bot API.
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(
        client: reqwest::Client,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self::with_api_base(client, TELEGRAM_API_BASE, bot_token, chat_id)
    }

    /// Build a notifier whose HTTP client gives up after `timeout`.
    pub fn with_timeout(
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| NotifyError::Transport(err.to_string()))?;
        Ok(Self::new(client, bot_token, chat_id))
    }

    pub fn with_api_base(
        client: reqwest::Client,
        api_base: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn publish(&self, notice: &ApplicationNotice) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let response = self
            .client
            .post(url)
            .json(&json!({
                "chat_id": self.chat_id,
                "text": notice.render(),
                "disable_web_page_preview": true,
            }))
            .send()
            .await
            .map_err(|err| NotifyError::Transport(err.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}
