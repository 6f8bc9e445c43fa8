use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::domain::WorkerState;

use super::transcription_worker::{TranscriptionWorker, WorkerError};

/// Owns the background worker task from startup to shutdown.
pub struct WorkerSupervisor {
    cancel: CancellationToken,
    handle: JoinHandle<Result<(), WorkerError>>,
    state: watch::Receiver<WorkerState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    Stopped,
    Abandoned,
}

impl WorkerSupervisor {
    /// Spawns the worker and waits until it is either running or has failed
    /// to start.
    pub async fn start(worker: TranscriptionWorker) -> Result<Self, WorkerError> {
        let cancel = CancellationToken::new();
        let mut state = worker.subscribe();
        let handle = tokio::spawn(worker.run(cancel.clone()));

        let started = state
            .wait_for(|s| matches!(s, WorkerState::Running | WorkerState::Stopped))
            .await
            .map(|s| *s == WorkerState::Running)
            .unwrap_or(false);

        if started {
            return Ok(Self {
                cancel,
                handle,
                state,
            });
        }

        match handle.await {
            Ok(Err(e)) => Err(e),
            Ok(Ok(())) => Err(WorkerError::ExitedEarly),
            Err(e) => Err(WorkerError::Task(e.to_string())),
        }
    }

    pub fn state(&self) -> watch::Receiver<WorkerState> {
        self.state.clone()
    }

    /// Cancels the worker and waits at most `timeout` for it to stop. A worker
    /// still busy after the timeout is aborted and abandoned.
    pub async fn shutdown(self, timeout: Duration) -> ShutdownOutcome {
        tracing::info!(timeout_secs = timeout.as_secs_f64(), "Stopping transcription worker");
        self.cancel.cancel();

        let mut handle = self.handle;
        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(Ok(()))) => {
                tracing::info!("Transcription worker shut down cleanly");
                ShutdownOutcome::Stopped
            }
            Ok(Ok(Err(e))) => {
                tracing::error!(error = %e, "Transcription worker ended with error");
                ShutdownOutcome::Stopped
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Transcription worker task failed");
                ShutdownOutcome::Stopped
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs_f64(),
                    "Transcription worker did not stop in time, abandoning it"
                );
                handle.abort();
                ShutdownOutcome::Abandoned
            }
        }
    }
}
