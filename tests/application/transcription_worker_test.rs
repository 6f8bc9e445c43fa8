use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use whisper_relay::application::ports::QueueConnector;
use whisper_relay::application::services::{TranscriptionWorker, WorkerError};
use whisper_relay::domain::{TranscribeResponse, WorkerState};

use crate::helpers::{
    CORRUPT_AUDIO, MockAudioStore, MockConnector, TEST_BUCKET, TestPipeline, TestQueue,
    failing_receive_connector,
};

fn pipeline() -> TestPipeline {
    TestPipeline::new(
        MockAudioStore::default()
            .with_object(TEST_BUCKET, "one.wav", b"first")
            .with_object(TEST_BUCKET, "two.wav", b"second")
            .with_object(TEST_BUCKET, "three.wav", b"third")
            .with_object(TEST_BUCKET, "broken.wav", CORRUPT_AUDIO),
    )
}

fn worker_for(queue: &TestQueue, pipeline: &TestPipeline) -> TranscriptionWorker {
    TranscriptionWorker::new(
        Arc::clone(&queue.connector) as Arc<dyn QueueConnector>,
        Arc::clone(&pipeline.service),
    )
}

fn decode(payload: &[u8]) -> TranscribeResponse {
    serde_json::from_slice(payload).unwrap()
}

#[tokio::test]
async fn given_requests_when_worker_drains_source_then_publishes_results_keyed_by_file_name() {
    let pipeline = pipeline();
    let mut queue = TestQueue::new();
    queue.send_json(&TestQueue::request_json("one.wav"));
    queue.send_json(&TestQueue::request_json("two.wav"));
    queue.close_inbound();

    let worker = worker_for(&queue, &pipeline);
    let state = worker.subscribe();
    worker.run(CancellationToken::new()).await.unwrap();

    let published = queue.published();
    assert_eq!(published.len(), 2);
    assert_eq!(published[0].0, b"one.wav");
    assert_eq!(decode(&published[0].1).recognized_text, "first");
    assert_eq!(published[1].0, b"two.wav");
    assert_eq!(decode(&published[1].1).recognized_text, "second");
    assert_eq!(*state.borrow(), WorkerState::Stopped);
}

#[tokio::test]
async fn given_malformed_message_when_consuming_then_skips_it_and_continues() {
    let pipeline = pipeline();
    let mut queue = TestQueue::new();
    queue.send_json(&TestQueue::request_json("one.wav"));
    queue.send_json("{not json");
    queue.send_json(r#"{"bucket":"audio"}"#);
    queue.send_json(&TestQueue::request_json("three.wav"));
    queue.close_inbound();

    worker_for(&queue, &pipeline)
        .run(CancellationToken::new())
        .await
        .unwrap();

    let keys: Vec<Vec<u8>> = queue.published().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![b"one.wav".to_vec(), b"three.wav".to_vec()]);
}

#[tokio::test]
async fn given_failing_transcription_when_consuming_then_skips_it_and_continues() {
    let pipeline = pipeline();
    let mut queue = TestQueue::new();
    queue.send_json(&TestQueue::request_json("broken.wav"));
    queue.send_json(&TestQueue::request_json("missing.wav"));
    queue.send_json(&TestQueue::request_json("two.wav"));
    queue.close_inbound();

    worker_for(&queue, &pipeline)
        .run(CancellationToken::new())
        .await
        .unwrap();

    let published = queue.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, b"two.wav");
    assert_eq!(pipeline.scratch_entries(), 0);
}

#[tokio::test]
async fn given_publish_failure_when_consuming_then_continues_with_next_message() {
    let pipeline = pipeline();
    let mut queue = TestQueue::with_publish_failure(Some("one.wav"));
    queue.send_json(&TestQueue::request_json("one.wav"));
    queue.send_json(&TestQueue::request_json("two.wav"));
    queue.close_inbound();

    worker_for(&queue, &pipeline)
        .run(CancellationToken::new())
        .await
        .unwrap();

    let published = queue.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, b"two.wav");
}

#[tokio::test]
async fn given_unreachable_broker_when_starting_then_fails_and_stops() {
    let pipeline = pipeline();
    let worker = TranscriptionWorker::new(
        Arc::new(MockConnector::refusing()),
        Arc::clone(&pipeline.service),
    );
    let state = worker.subscribe();

    let result = worker.run(CancellationToken::new()).await;

    assert!(matches!(result, Err(WorkerError::Connect(_))));
    assert_eq!(*state.borrow(), WorkerState::Stopped);
}

#[tokio::test]
async fn given_idle_worker_when_cancelled_then_drains_and_closes_session() {
    let pipeline = pipeline();
    let queue = TestQueue::new();
    let worker = worker_for(&queue, &pipeline);
    let mut state = worker.subscribe();
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(worker.run(cancel.clone()));
    state
        .wait_for(|s| *s == WorkerState::Running)
        .await
        .unwrap();

    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();

    assert!(result.is_ok());
    assert_eq!(*state.borrow(), WorkerState::Stopped);
    assert!(*queue.consumer_closed.lock().unwrap());
    assert!(*queue.publisher_closed.lock().unwrap());
}

#[tokio::test]
async fn given_running_worker_when_message_arrives_then_result_is_published() {
    let pipeline = pipeline();
    let queue = TestQueue::new();
    let worker = worker_for(&queue, &pipeline);
    let mut state = worker.subscribe();
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(worker.run(cancel.clone()));
    state
        .wait_for(|s| *s == WorkerState::Running)
        .await
        .unwrap();

    queue.send_json(&TestQueue::request_json("three.wav"));
    for _ in 0..100 {
        if !queue.published().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cancel.cancel();
    handle.await.unwrap().unwrap();

    let published = queue.published();
    assert_eq!(published.len(), 1);
    assert_eq!(decode(&published[0].1).recognized_text, "third");
}

#[tokio::test]
async fn given_persistent_receive_errors_when_consuming_then_backs_off_between_attempts() {
    let pipeline = pipeline();
    let (connector, attempts) = failing_receive_connector();
    let worker = TranscriptionWorker::new(connector, Arc::clone(&pipeline.service))
        .with_receive_backoff(Duration::from_millis(200));
    let mut state = worker.subscribe();
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(worker.run(cancel.clone()));
    state
        .wait_for(|s| *s == WorkerState::Running)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    let seen = attempts.load(Ordering::SeqCst);
    assert!((1..=4).contains(&seen), "unexpected attempt count {}", seen);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(*state.borrow(), WorkerState::Stopped);
}

#[tokio::test]
async fn given_worker_backing_off_when_cancelled_then_stops_without_waiting_out_backoff() {
    let pipeline = pipeline();
    let (connector, attempts) = failing_receive_connector();
    let worker = TranscriptionWorker::new(connector, Arc::clone(&pipeline.service))
        .with_receive_backoff(Duration::from_secs(60));
    let mut state = worker.subscribe();
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(worker.run(cancel.clone()));
    state
        .wait_for(|s| *s == WorkerState::Running)
        .await
        .unwrap();
    while attempts.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();

    assert!(result.is_ok());
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
