use bytes::Bytes;

/// Byte-level access to the object store holding source audio.
#[async_trait::async_trait]
pub trait AudioStore: Send + Sync {
    /// Fetches the whole object. An existing empty object yields empty bytes.
    async fn get_object(&self, bucket: &str, name: &str) -> Result<Bytes, AudioStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AudioStoreError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    #[error("object store unavailable: {0}")]
    Unavailable(String),
}
