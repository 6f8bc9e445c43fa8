use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::application::ports::{
    InboundMessage, MessagePublisher, QueueConnector, QueueError, QueueSession,
};
use crate::domain::{TranscribeRequest, WorkerState};

use super::transcription_service::TranscriptionService;

const DEFAULT_RECEIVE_BACKOFF: Duration = Duration::from_secs(1);

/// Long-running consumer that turns inbound requests into outbound results.
///
/// Messages are handled one at a time in receipt order. A message that cannot
/// be parsed, transcribed or published is logged and skipped; only a failure
/// to connect at startup ends the worker with an error.
pub struct TranscriptionWorker {
    connector: Arc<dyn QueueConnector>,
    service: Arc<TranscriptionService>,
    state: watch::Sender<WorkerState>,
    receive_backoff: Duration,
}

impl TranscriptionWorker {
    pub fn new(connector: Arc<dyn QueueConnector>, service: Arc<TranscriptionService>) -> Self {
        let (state, _) = watch::channel(WorkerState::Starting);
        Self {
            connector,
            service,
            state,
            receive_backoff: DEFAULT_RECEIVE_BACKOFF,
        }
    }

    /// Pause after a failed receive before asking the consumer again.
    pub fn with_receive_backoff(mut self, backoff: Duration) -> Self {
        self.receive_backoff = backoff;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    pub async fn run(self, cancel: CancellationToken) -> Result<(), WorkerError> {
        self.transition(WorkerState::Starting);

        let session = match self.connector.connect().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(error = %e, "Transcription worker failed to connect");
                self.transition(WorkerState::Stopped);
                return Err(WorkerError::Connect(e));
            }
        };

        self.transition(WorkerState::Running);
        tracing::info!("Transcription worker started");

        let session = self.consume(session, &cancel).await;

        self.transition(WorkerState::Draining);
        session.close().await;
        self.transition(WorkerState::Stopped);
        tracing::info!("Transcription worker stopped");

        Ok(())
    }

    async fn consume(&self, mut session: QueueSession, cancel: &CancellationToken) -> QueueSession {
        loop {
            let received = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Cancellation requested, draining worker");
                    break;
                }
                received = session.consumer.recv() => received,
            };

            match received {
                Ok(Some(message)) => {
                    self.handle_message(message, session.publisher.as_ref())
                        .await;
                }
                Ok(None) => {
                    tracing::info!("Inbound source exhausted");
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        backoff_ms = self.receive_backoff.as_millis() as u64,
                        "Failed to receive message"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            tracing::info!("Cancellation requested, draining worker");
                            break;
                        }
                        _ = tokio::time::sleep(self.receive_backoff) => {}
                    }
                }
            }
        }
        session
    }

    async fn handle_message(&self, message: InboundMessage, publisher: &dyn MessagePublisher) {
        tracing::debug!(
            payload = %String::from_utf8_lossy(&message.payload),
            "Received message"
        );

        let request: TranscribeRequest = match serde_json::from_slice(&message.payload) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    payload = %String::from_utf8_lossy(&message.payload),
                    "Skipping unparseable message"
                );
                return;
            }
        };

        let span = tracing::info_span!(
            "transcription_message",
            bucket = %request.bucket,
            file_name = %request.file_name,
        );

        self.process(request, publisher).instrument(span).await;
    }

    async fn process(&self, request: TranscribeRequest, publisher: &dyn MessagePublisher) {
        tracing::info!("Processing file");

        let response = match self.service.transcribe(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Transcription failed, skipping message");
                return;
            }
        };

        let payload = match serde_json::to_vec(&response) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize transcription result");
                return;
            }
        };

        match publisher
            .publish(request.file_name.as_bytes(), &payload)
            .await
        {
            Ok(()) => tracing::info!("Transcription result published"),
            Err(e) => tracing::error!(error = %e, "Failed to publish transcription result"),
        }
    }

    fn transition(&self, next: WorkerState) {
        tracing::debug!(state = %next, "Worker state transition");
        self.state.send_replace(next);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("queue connection: {0}")]
    Connect(#[from] QueueError),
    #[error("worker exited before reaching running state")]
    ExitedEarly,
    #[error("worker task failed: {0}")]
    Task(String),
}
