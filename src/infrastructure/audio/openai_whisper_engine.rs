use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};
use crate::domain::InferenceResult;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Remote engine speaking the OpenAI `/audio/transcriptions` protocol.
///
/// Also works against self-hosted compatible servers, which accept the local
/// model names (`medium`, `large-v2`, ...).
pub struct OpenAiWhisperEngine {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    language: Option<String>,
    text: String,
}

impl OpenAiWhisperEngine {
    pub fn new(api_key: Option<String>, base_url: Option<String>, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            model,
        }
    }
}

#[async_trait]
impl TranscriptionEngine for OpenAiWhisperEngine {
    async fn transcribe(&self, audio_path: &Path) -> Result<InferenceResult, TranscriptionError> {
        let url = format!("{}/audio/transcriptions", self.base_url);
        let audio = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("audio")
            .to_string();

        let form = multipart::Form::new()
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .part("file", multipart::Part::bytes(audio).file_name(file_name));

        tracing::debug!(model = %self.model, url = %url, "Sending audio to Whisper API");

        let mut request = self.client.post(&url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TranscriptionError::ApiRequestFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let result: VerboseTranscription = response
            .json()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("parse response: {}", e)))?;

        let language = result
            .language
            .filter(|l| !l.is_empty())
            .ok_or_else(|| {
                TranscriptionError::ApiRequestFailed("response carries no language".to_string())
            })?;

        tracing::info!(
            language = %language,
            chars = result.text.len(),
            "Whisper API transcription completed"
        );

        Ok(InferenceResult::new(language, result.text.trim()))
    }
}
