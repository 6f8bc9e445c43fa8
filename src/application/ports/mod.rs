mod audio_store;
mod message_queue;
mod transcription_engine;

pub use audio_store::{AudioStore, AudioStoreError};
pub use message_queue::{
    InboundMessage, MessageConsumer, MessagePublisher, QueueConnector, QueueError, QueueSession,
};
pub use transcription_engine::{EngineLoader, TranscriptionEngine, TranscriptionError};
