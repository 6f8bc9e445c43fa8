use std::path::PathBuf;

use bytes::Bytes;
use object_store::local::LocalFileSystem;
use object_store::path::Path as StorePath;

use crate::application::ports::{AudioStore, AudioStoreError};

use super::fetch_object;

/// Directory-backed store; each bucket is a subdirectory of `base_path`.
pub struct LocalAudioStore {
    inner: LocalFileSystem,
}

impl LocalAudioStore {
    pub fn new(base_path: PathBuf) -> Result<Self, AudioStoreError> {
        std::fs::create_dir_all(&base_path)
            .map_err(|e| AudioStoreError::Unavailable(e.to_string()))?;
        let fs = LocalFileSystem::new_with_prefix(base_path)
            .map_err(|e| AudioStoreError::Unavailable(e.to_string()))?;
        Ok(Self { inner: fs })
    }
}

#[async_trait::async_trait]
impl AudioStore for LocalAudioStore {
    async fn get_object(&self, bucket: &str, name: &str) -> Result<Bytes, AudioStoreError> {
        let path = StorePath::parse(format!("{}/{}", bucket, name))
            .map_err(|e| AudioStoreError::InvalidKey(e.to_string()))?;
        fetch_object(&self.inner, &path).await
    }
}
