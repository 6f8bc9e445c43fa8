use std::sync::Arc;

use tokio::sync::watch;

use crate::application::services::TranscriptionService;
use crate::domain::WorkerState;

#[derive(Clone)]
pub struct AppState {
    pub transcription_service: Arc<TranscriptionService>,
    /// `None` when the queue worker is disabled by configuration.
    pub worker_state: Option<watch::Receiver<WorkerState>>,
}

impl AppState {
    pub fn new(
        transcription_service: Arc<TranscriptionService>,
        worker_state: Option<watch::Receiver<WorkerState>>,
    ) -> Self {
        Self {
            transcription_service,
            worker_state,
        }
    }
}
