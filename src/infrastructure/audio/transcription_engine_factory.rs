use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::{EngineLoader, TranscriptionEngine, TranscriptionError};
use crate::domain::WhisperModel;
use crate::presentation::config::{TranscriptionProviderSetting, TranscriptionSettings};

use super::candle_whisper_engine::CandleWhisperEngine;
use super::openai_whisper_engine::OpenAiWhisperEngine;

/// [`EngineLoader`] for the configured provider.
pub struct TranscriptionEngineFactory {
    provider: TranscriptionProviderSetting,
    api_key: Option<String>,
    base_url: Option<String>,
    remote_model: Option<String>,
}

impl TranscriptionEngineFactory {
    pub fn new(settings: &TranscriptionSettings) -> Self {
        Self {
            provider: settings.provider,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.clone(),
            remote_model: settings.remote_model.clone(),
        }
    }
}

#[async_trait]
impl EngineLoader for TranscriptionEngineFactory {
    async fn load(
        &self,
        model: WhisperModel,
    ) -> Result<Arc<dyn TranscriptionEngine>, TranscriptionError> {
        match self.provider {
            TranscriptionProviderSetting::Local => {
                let engine = tokio::task::spawn_blocking(move || CandleWhisperEngine::new(model))
                    .await
                    .map_err(|e| {
                        TranscriptionError::ModelLoadFailed(format!("loader task: {}", e))
                    })??;
                Ok(Arc::new(engine))
            }
            TranscriptionProviderSetting::OpenAi => {
                let remote_model = self
                    .remote_model
                    .clone()
                    .unwrap_or_else(|| model.as_str().to_string());
                let engine = OpenAiWhisperEngine::new(
                    self.api_key.clone(),
                    self.base_url.clone(),
                    remote_model,
                );
                Ok(Arc::new(engine))
            }
        }
    }
}
