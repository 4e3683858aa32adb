use async_trait::async_trait;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use super::domain::UploadedDocument;
use super::prompts::PromptKind;
use super::validation::resolve_content_type;
use crate::config::{ConfigError, ModelConfig};

/// Document bytes prepared for inline transport to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDocument {
    pub mime_type: String,
    pub data: String,
}

impl EncodedDocument {
    pub fn from_upload(document: &UploadedDocument) -> Self {
        let mime_type = resolve_content_type(&document.file_name, document.content_type.as_deref())
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.essence_str().to_string());
        Self {
            mime_type,
            data: base64::engine::general_purpose::STANDARD.encode(&document.bytes),
        }
    }
}

/// One prompt plus the document it refers to.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub kind: PromptKind,
    pub prompt: String,
    pub document: &'a EncodedDocument,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model API error [{status}]: {message}")]
    Api { status: u16, message: String },
    #[error("model returned no text")]
    EmptyResponse,
    #[error("model reply was not the expected JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Seam between the screening flows and the hosted model.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Run a prompt against a document and return the raw text reply.
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, ModelError>;
}

/// Google Gemini `generateContent` client.
pub struct GeminiModel {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiModel {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            client,
        }
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self, GeminiSetupError> {
        let api_key = config.require_api_key()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(GeminiSetupError::Client)?;
        Ok(Self::new(
            api_key,
            config.model.clone(),
            config.base_url.clone(),
            client,
        ))
    }

    pub fn model_id(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn request_body(request: &GenerationRequest<'_>) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": request.prompt },
                    {
                        "inline_data": {
                            "mime_type": request.document.mime_type,
                            "data": request.document.data,
                        }
                    }
                ]
            }],
            "generationConfig": {
                "temperature": 0.1,
                "responseMimeType": "application/json",
            }
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiSetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unable to build HTTP client: {0}")]
    Client(reqwest::Error),
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<String, ModelError> {
        debug!(
            prompt = request.kind.label(),
            model = %self.model,
            mime_type = %request.document.mime_type,
            "calling generative model"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(&request))
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        let body: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);
        if !status.is_success() {
            let message = body["error"]["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| {
                    let snippet: String = raw.trim().chars().take(200).collect();
                    if snippet.is_empty() {
                        "unknown API error".to_string()
                    } else {
                        snippet
                    }
                });
            return Err(ModelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = body["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part["text"].as_str())
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Deserialize a model reply, tolerating a surrounding Markdown code fence.
pub fn parse_json_reply<T: DeserializeOwned>(reply: &str) -> Result<T, ModelError> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err(ModelError::EmptyResponse);
    }

    let unfenced = match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    };

    Ok(serde_json::from_str(unfenced)?)
}
