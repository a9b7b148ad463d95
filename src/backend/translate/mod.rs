//! Message Translation
//!
//! Client for the cloud translation collaborator (Google Cloud Translate v3
//! REST shape). Translation is optional: without `GOOGLE_PROJECT_ID` the
//! client reports itself unconfigured and callers decide how to degrade -
//! the REST surface falls back to the original text, the live protocol
//! answers with an explicit error frame.

use serde::Deserialize;

use crate::backend::error::ChatError;

const DEFAULT_ENDPOINT: &str = "https://translation.googleapis.com";

/// Settings for the translation collaborator
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    pub endpoint: String,
    pub project_id: String,
    pub api_key: Option<String>,
}

impl TranslatorConfig {
    /// Read from environment; `None` when `GOOGLE_PROJECT_ID` is unset
    pub fn from_env() -> Option<Self> {
        let project_id = std::env::var("GOOGLE_PROJECT_ID").ok()?;
        Some(Self {
            endpoint: std::env::var("TRANSLATE_API_URL")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            project_id,
            api_key: std::env::var("TRANSLATE_API_KEY").ok(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Client for the translation collaborator
#[derive(Clone)]
pub struct Translator {
    http: reqwest::Client,
    config: Option<TranslatorConfig>,
}

impl Translator {
    pub fn new(config: Option<TranslatorConfig>) -> Self {
        if config.is_none() {
            tracing::warn!("[Translate] GOOGLE_PROJECT_ID not set, translation is disabled");
        }
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// Translate `text` into `target_language`
    pub async fn translate(&self, text: &str, target_language: &str) -> Result<String, ChatError> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| ChatError::upstream("Translation service not configured"))?;

        let url = format!(
            "{}/v3/projects/{}/locations/global:translateText",
            config.endpoint, config.project_id
        );

        let mut request = self.http.post(&url).json(&serde_json::json!({
            "contents": [text],
            "mimeType": "text/plain",
            "targetLanguageCode": target_language,
        }));
        if let Some(key) = &config.api_key {
            request = request.query(&[("key", key)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ChatError::upstream(format!("Translation request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(ChatError::upstream(format!(
                "Translation request failed: {status}"
            )));
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| ChatError::upstream(format!("Translation response malformed: {e}")))?;

        parsed
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| ChatError::upstream("Translation response was empty"))
    }
}
