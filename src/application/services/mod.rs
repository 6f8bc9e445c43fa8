mod audio_resource;
mod engine_registry;
mod transcription_service;
mod transcription_worker;
mod worker_supervisor;

pub use audio_resource::AudioResource;
pub use engine_registry::EngineRegistry;
pub use transcription_service::{TranscriptionService, TranscriptionServiceError};
pub use transcription_worker::{TranscriptionWorker, WorkerError};
pub use worker_supervisor::{ShutdownOutcome, WorkerSupervisor};
