use async_trait::async_trait;

/// One record read from the inbound topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub key: Option<Vec<u8>>,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            key: None,
            payload: payload.into(),
        }
    }
}

#[async_trait]
pub trait MessageConsumer: Send {
    /// Waits for the next message. `Ok(None)` means the source is exhausted
    /// and will never yield again.
    async fn recv(&mut self) -> Result<Option<InboundMessage>, QueueError>;

    async fn close(&mut self);
}

#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, key: &[u8], payload: &[u8]) -> Result<(), QueueError>;

    async fn close(&self);
}

/// Connected consumer/producer pair owned by the worker for its lifetime.
pub struct QueueSession {
    pub consumer: Box<dyn MessageConsumer>,
    pub publisher: Box<dyn MessagePublisher>,
}

impl QueueSession {
    pub fn new(consumer: Box<dyn MessageConsumer>, publisher: Box<dyn MessagePublisher>) -> Self {
        Self {
            consumer,
            publisher,
        }
    }

    pub async fn close(mut self) {
        self.consumer.close().await;
        self.publisher.close().await;
    }
}

/// Establishes a [`QueueSession`]. Returns only once both sides are confirmed
/// connected.
#[async_trait]
pub trait QueueConnector: Send + Sync {
    async fn connect(&self) -> Result<QueueSession, QueueError>;
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
    #[error("publish failed: {0}")]
    PublishFailed(String),
}
