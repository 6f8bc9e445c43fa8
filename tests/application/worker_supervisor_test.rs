use std::sync::Arc;
use std::time::Duration;

use whisper_relay::application::ports::QueueConnector;
use whisper_relay::application::services::{
    ShutdownOutcome, TranscriptionWorker, WorkerError, WorkerSupervisor,
};
use whisper_relay::domain::WorkerState;

use crate::helpers::{MockAudioStore, MockConnector, MockEngine, TEST_BUCKET, TestPipeline, TestQueue};

fn worker_for(queue: &TestQueue, pipeline: &TestPipeline) -> TranscriptionWorker {
    TranscriptionWorker::new(
        Arc::clone(&queue.connector) as Arc<dyn QueueConnector>,
        Arc::clone(&pipeline.service),
    )
}

#[tokio::test]
async fn given_reachable_broker_when_starting_then_worker_is_running() {
    let pipeline = TestPipeline::new(MockAudioStore::default());
    let queue = TestQueue::new();

    let supervisor = WorkerSupervisor::start(worker_for(&queue, &pipeline))
        .await
        .unwrap();

    assert_eq!(*supervisor.state().borrow(), WorkerState::Running);
    assert_eq!(
        supervisor.shutdown(Duration::from_secs(1)).await,
        ShutdownOutcome::Stopped
    );
}

#[tokio::test]
async fn given_running_worker_when_shutting_down_then_state_ends_stopped() {
    let pipeline = TestPipeline::new(MockAudioStore::default());
    let queue = TestQueue::new();
    let supervisor = WorkerSupervisor::start(worker_for(&queue, &pipeline))
        .await
        .unwrap();
    let state = supervisor.state();

    let outcome = supervisor.shutdown(Duration::from_secs(1)).await;

    assert_eq!(outcome, ShutdownOutcome::Stopped);
    assert_eq!(*state.borrow(), WorkerState::Stopped);
}

#[tokio::test]
async fn given_unreachable_broker_when_starting_then_returns_connect_error() {
    let pipeline = TestPipeline::new(MockAudioStore::default());
    let worker = TranscriptionWorker::new(
        Arc::new(MockConnector::refusing()),
        Arc::clone(&pipeline.service),
    );

    let result = WorkerSupervisor::start(worker).await;

    assert!(matches!(result, Err(WorkerError::Connect(_))));
}

#[tokio::test]
async fn given_stuck_message_when_shutdown_times_out_then_worker_is_abandoned() {
    let pipeline = TestPipeline::with_engine(
        MockAudioStore::default().with_object(TEST_BUCKET, "long.wav", b"lecture"),
        MockEngine {
            delay: Some(Duration::from_secs(30)),
            ..Default::default()
        },
        0,
    );
    let queue = TestQueue::new();
    let supervisor = WorkerSupervisor::start(worker_for(&queue, &pipeline))
        .await
        .unwrap();

    queue.send_json(&TestQueue::request_json("long.wav"));
    for _ in 0..100 {
        if !pipeline.engine.seen_paths().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let started = std::time::Instant::now();
    let outcome = supervisor.shutdown(Duration::from_millis(100)).await;

    assert_eq!(outcome, ShutdownOutcome::Abandoned);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(queue.published().is_empty());
}
