use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;

use whisper_relay::application::services::{
    EngineRegistry, TranscriptionService, TranscriptionWorker, WorkerSupervisor,
};
use whisper_relay::domain::{WhisperModel, WorkerState};
use whisper_relay::infrastructure::audio::TranscriptionEngineFactory;
use whisper_relay::infrastructure::messaging::KafkaConnector;
use whisper_relay::infrastructure::observability::{TracingConfig, init_tracing};
use whisper_relay::infrastructure::storage::AudioStoreFactory;
use whisper_relay::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(anyhow::Error::msg)?;

    let settings = Settings::load(environment).context("failed to load configuration")?;

    init_tracing(&TracingConfig::new(environment, &settings.logging));

    let default_model: WhisperModel = settings
        .transcription
        .default_model
        .parse()
        .map_err(anyhow::Error::msg)?;

    let audio_store =
        AudioStoreFactory::create(&settings.storage).context("failed to create audio store")?;
    let engines = Arc::new(EngineRegistry::new(Arc::new(
        TranscriptionEngineFactory::new(&settings.transcription),
    )));
    let transcription_service = Arc::new(TranscriptionService::new(
        audio_store,
        engines,
        settings.transcription.scratch_dir(),
        default_model,
    ));

    let supervisor = if settings.messaging.enabled {
        let connector = Arc::new(KafkaConnector::new(&settings.messaging));
        let worker = TranscriptionWorker::new(connector, Arc::clone(&transcription_service))
            .with_receive_backoff(Duration::from_millis(settings.worker.receive_backoff_ms));
        match WorkerSupervisor::start(worker).await {
            Ok(supervisor) => Some(supervisor),
            Err(e) => {
                tracing::error!(error = %e, "Transcription worker failed to start");
                None
            }
        }
    } else {
        tracing::info!("Messaging disabled, serving HTTP only");
        None
    };

    let worker_state = match (&supervisor, settings.messaging.enabled) {
        (Some(supervisor), _) => Some(supervisor.state()),
        (None, true) => Some(watch::channel(WorkerState::Stopped).1),
        (None, false) => None,
    };

    let router = create_router(AppState::new(transcription_service, worker_state));

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("invalid server address")?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, default_model = %default_model, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(supervisor) = supervisor {
        let timeout = Duration::from_secs(settings.worker.shutdown_timeout_secs);
        supervisor.shutdown(timeout).await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
