mod kafka;

pub use kafka::{KafkaConnector, KafkaConsumer, KafkaPublisher};
