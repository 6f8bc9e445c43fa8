use std::path::PathBuf;
use std::sync::Arc;

use crate::application::ports::{AudioStore, AudioStoreError, TranscriptionError};
use crate::domain::{InvalidRequest, TranscribeRequest, TranscribeResponse, WhisperModel};

use super::audio_resource::AudioResource;
use super::engine_registry::EngineRegistry;

/// Shared logic behind the HTTP endpoint and the queue worker: fetch the audio
/// object, materialize it locally, run the engine, assemble the response.
pub struct TranscriptionService {
    audio_store: Arc<dyn AudioStore>,
    engines: Arc<EngineRegistry>,
    scratch_dir: PathBuf,
    default_model: WhisperModel,
}

impl TranscriptionService {
    pub fn new(
        audio_store: Arc<dyn AudioStore>,
        engines: Arc<EngineRegistry>,
        scratch_dir: PathBuf,
        default_model: WhisperModel,
    ) -> Self {
        Self {
            audio_store,
            engines,
            scratch_dir,
            default_model,
        }
    }

    pub fn default_model(&self) -> WhisperModel {
        self.default_model
    }

    #[tracing::instrument(
        skip(self, request),
        fields(bucket = %request.bucket, file_name = %request.file_name)
    )]
    pub async fn transcribe(
        &self,
        request: &TranscribeRequest,
    ) -> Result<TranscribeResponse, TranscriptionServiceError> {
        request.validate()?;

        let bytes = self
            .audio_store
            .get_object(&request.bucket, &request.file_name)
            .await
            .map_err(|e| match e {
                AudioStoreError::InvalidKey(key) => {
                    TranscriptionServiceError::InvalidRequest(InvalidRequest::InvalidKey(key))
                }
                other => TranscriptionServiceError::StorageUnavailable(other.to_string()),
            })?;

        tracing::debug!(bytes = bytes.len(), "Audio object fetched");

        let resource = AudioResource::materialize(&self.scratch_dir, &request.file_name, bytes)
            .await
            .map_err(|e| {
                TranscriptionServiceError::StorageUnavailable(format!("scratch write: {}", e))
            })?;

        let result = resource
            .scoped(|audio_path| async move {
                let model = WhisperModel::resolve(request.model.as_deref(), self.default_model)
                    .map_err(TranscriptionServiceError::EngineInit)?;

                let engine = self
                    .engines
                    .get_or_load(model)
                    .await
                    .map_err(|e| TranscriptionServiceError::EngineInit(e.to_string()))?;

                tracing::debug!(model = %model, "Starting transcription");

                engine
                    .transcribe(&audio_path)
                    .await
                    .map_err(TranscriptionServiceError::Inference)
            })
            .await?;

        tracing::info!(
            language = %result.language,
            chars = result.text.len(),
            "Transcription completed"
        );

        Ok(TranscribeResponse::from(result))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionServiceError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] InvalidRequest),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("engine initialization failed: {0}")]
    EngineInit(String),
    #[error("inference failed: {0}")]
    Inference(TranscriptionError),
}
