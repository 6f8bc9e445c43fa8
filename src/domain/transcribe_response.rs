use serde::{Deserialize, Serialize};

use super::InferenceResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub detected_language: String,
    pub recognized_text: String,
}

impl From<InferenceResult> for TranscribeResponse {
    fn from(result: InferenceResult) -> Self {
        Self {
            detected_language: result.language,
            recognized_text: result.text,
        }
    }
}
