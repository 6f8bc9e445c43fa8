use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};

use crate::application::ports::{
    InboundMessage, MessageConsumer, MessagePublisher, QueueConnector, QueueError, QueueSession,
};
use crate::presentation::config::MessagingSettings;

/// Connects the worker to Kafka: a consumer-group member on the inbound topic
/// and a producer for the outbound topic.
pub struct KafkaConnector {
    bootstrap_servers: String,
    group_id: String,
    inbound_topic: String,
    outbound_topic: String,
    connect_timeout: Duration,
    publish_timeout: Duration,
}

impl KafkaConnector {
    pub fn new(settings: &MessagingSettings) -> Self {
        Self {
            bootstrap_servers: settings.bootstrap_servers.clone(),
            group_id: settings.group_id.clone(),
            inbound_topic: settings.inbound_topic.clone(),
            outbound_topic: settings.outbound_topic.clone(),
            connect_timeout: Duration::from_secs(settings.connect_timeout_secs),
            publish_timeout: Duration::from_secs(settings.publish_timeout_secs),
        }
    }

    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", &self.bootstrap_servers);
        config
    }

    async fn connect_consumer(&self) -> Result<StreamConsumer, QueueError> {
        let consumer: StreamConsumer = self
            .client_config()
            .set("group.id", &self.group_id)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "earliest")
            .create()
            .map_err(|e| QueueError::ConnectionFailed(format!("consumer: {}", e)))?;

        consumer
            .subscribe(&[self.inbound_topic.as_str()])
            .map_err(|e| QueueError::ConnectionFailed(format!("subscribe: {}", e)))?;

        let topic = self.inbound_topic.clone();
        let timeout = self.connect_timeout;
        tokio::task::spawn_blocking(move || {
            consumer
                .fetch_metadata(Some(&topic), timeout)
                .map(|_| consumer)
                .map_err(|e| QueueError::ConnectionFailed(format!("consumer metadata: {}", e)))
        })
        .await
        .map_err(|e| QueueError::ConnectionFailed(e.to_string()))?
    }

    async fn connect_producer(&self) -> Result<FutureProducer, QueueError> {
        let producer: FutureProducer = self
            .client_config()
            .set("message.timeout.ms", self.publish_timeout.as_millis().to_string())
            .create()
            .map_err(|e| QueueError::ConnectionFailed(format!("producer: {}", e)))?;

        let handle = producer.clone();
        let topic = self.outbound_topic.clone();
        let timeout = self.connect_timeout;
        tokio::task::spawn_blocking(move || {
            handle
                .client()
                .fetch_metadata(Some(&topic), timeout)
                .map(|_| ())
                .map_err(|e| QueueError::ConnectionFailed(format!("producer metadata: {}", e)))
        })
        .await
        .map_err(|e| QueueError::ConnectionFailed(e.to_string()))??;

        Ok(producer)
    }
}

#[async_trait]
impl QueueConnector for KafkaConnector {
    async fn connect(&self) -> Result<QueueSession, QueueError> {
        tracing::info!(
            bootstrap_servers = %self.bootstrap_servers,
            inbound_topic = %self.inbound_topic,
            outbound_topic = %self.outbound_topic,
            "Connecting Kafka consumer and producer"
        );

        let consumer = self.connect_consumer().await?;
        let producer = self.connect_producer().await?;

        tracing::info!("Kafka consumer and producer connected");

        Ok(QueueSession::new(
            Box::new(KafkaConsumer {
                inner: consumer,
                topic: self.inbound_topic.clone(),
            }),
            Box::new(KafkaPublisher {
                inner: producer,
                topic: self.outbound_topic.clone(),
                timeout: self.publish_timeout,
            }),
        ))
    }
}

pub struct KafkaConsumer {
    inner: StreamConsumer,
    topic: String,
}

#[async_trait]
impl MessageConsumer for KafkaConsumer {
    async fn recv(&mut self) -> Result<Option<InboundMessage>, QueueError> {
        let message = self
            .inner
            .recv()
            .await
            .map_err(|e| QueueError::ReceiveFailed(e.to_string()))?;

        tracing::trace!(
            topic = %self.topic,
            partition = message.partition(),
            offset = message.offset(),
            "Kafka message received"
        );

        Ok(Some(InboundMessage {
            key: message.key().map(<[u8]>::to_vec),
            payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
        }))
    }

    async fn close(&mut self) {
        self.inner.unsubscribe();
        tracing::info!(topic = %self.topic, "Kafka consumer stopped");
    }
}

pub struct KafkaPublisher {
    inner: FutureProducer,
    topic: String,
    timeout: Duration,
}

#[async_trait]
impl MessagePublisher for KafkaPublisher {
    async fn publish(&self, key: &[u8], payload: &[u8]) -> Result<(), QueueError> {
        let record = FutureRecord::to(&self.topic).key(key).payload(payload);
        self.inner
            .send(record, self.timeout)
            .await
            .map(|_| ())
            .map_err(|(e, _)| QueueError::PublishFailed(e.to_string()))
    }

    async fn close(&self) {
        let producer = self.inner.clone();
        let timeout = self.timeout;
        let flushed = tokio::task::spawn_blocking(move || producer.flush(timeout)).await;
        match flushed {
            Ok(Ok(())) => tracing::info!(topic = %self.topic, "Kafka producer stopped"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Kafka producer flush failed"),
            Err(e) => tracing::warn!(error = %e, "Kafka producer flush task failed"),
        }
    }
}
