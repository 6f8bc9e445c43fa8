use std::path::PathBuf;
use std::sync::Arc;

use crate::application::ports::{AudioStore, AudioStoreError};
use crate::presentation::config::{StorageProviderSetting, StorageSettings};

use super::local_store::LocalAudioStore;
use super::s3_store::S3AudioStore;

pub struct AudioStoreFactory;

impl AudioStoreFactory {
    pub fn create(settings: &StorageSettings) -> Result<Arc<dyn AudioStore>, AudioStoreError> {
        match settings.provider {
            StorageProviderSetting::Local => {
                let store = LocalAudioStore::new(PathBuf::from(&settings.local_path))?;
                Ok(Arc::new(store))
            }
            StorageProviderSetting::S3 => {
                let endpoint = settings.endpoint.as_deref().ok_or_else(|| {
                    AudioStoreError::Unavailable("storage.endpoint required".into())
                })?;
                let access_key = settings.access_key.as_deref().ok_or_else(|| {
                    AudioStoreError::Unavailable("storage.access_key required".into())
                })?;
                let secret_key = settings.secret_key.as_deref().ok_or_else(|| {
                    AudioStoreError::Unavailable("storage.secret_key required".into())
                })?;
                let store = S3AudioStore::new(
                    endpoint,
                    access_key,
                    secret_key,
                    &settings.region,
                    settings.use_ssl,
                )
                .with_max_retries(settings.max_retries);
                tracing::info!(
                    endpoint = %store.endpoint(),
                    use_ssl = settings.use_ssl,
                    "Using S3-compatible audio store"
                );
                Ok(Arc::new(store))
            }
        }
    }
}
