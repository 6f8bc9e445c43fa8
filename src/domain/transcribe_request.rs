use serde::{Deserialize, Serialize};

/// Identifies one audio object to transcribe.
///
/// `model` is kept as the raw identifier the caller sent; it is resolved
/// against [`WhisperModel`](super::WhisperModel) when the engine is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscribeRequest {
    pub bucket: String,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl TranscribeRequest {
    pub fn new(bucket: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            file_name: file_name.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn validate(&self) -> Result<(), InvalidRequest> {
        if self.bucket.trim().is_empty() {
            return Err(InvalidRequest::EmptyBucket);
        }
        if self.file_name.trim().is_empty() {
            return Err(InvalidRequest::EmptyFileName);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRequest {
    #[error("bucket must not be empty")]
    EmptyBucket,
    #[error("file_name must not be empty")]
    EmptyFileName,
    #[error("invalid object key: {0}")]
    InvalidKey(String),
}
