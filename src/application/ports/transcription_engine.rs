use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{InferenceResult, WhisperModel};

/// A loaded acoustic model.
///
/// Implementations must tolerate concurrent callers; any mutable model state is
/// serialized internally.
#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<InferenceResult, TranscriptionError>;
}

/// Builds an engine for one model identifier.
#[async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(
        &self,
        model: WhisperModel,
    ) -> Result<Arc<dyn TranscriptionEngine>, TranscriptionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("audio decoding failed: {0}")]
    DecodingFailed(String),
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
    #[error("model loading failed: {0}")]
    ModelLoadFailed(String),
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
