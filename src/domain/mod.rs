mod inference_result;
mod transcribe_request;
mod transcribe_response;
mod whisper_model;
mod worker_state;

pub use inference_result::InferenceResult;
pub use transcribe_request::{InvalidRequest, TranscribeRequest};
pub use transcribe_response::TranscribeResponse;
pub use whisper_model::WhisperModel;
pub use worker_state::WorkerState;
