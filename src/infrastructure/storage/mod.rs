mod local_store;
mod s3_store;
mod store_factory;

use bytes::Bytes;
use object_store::ObjectStore;
use object_store::path::Path as StorePath;

use crate::application::ports::AudioStoreError;

pub use local_store::LocalAudioStore;
pub use s3_store::S3AudioStore;
pub use store_factory::AudioStoreFactory;

async fn fetch_object(store: &dyn ObjectStore, path: &StorePath) -> Result<Bytes, AudioStoreError> {
    let result = store.get(path).await.map_err(|e| match e {
        object_store::Error::NotFound { path, .. } => AudioStoreError::NotFound(path),
        other => AudioStoreError::Unavailable(other.to_string()),
    })?;

    result
        .bytes()
        .await
        .map_err(|e| AudioStoreError::Unavailable(e.to_string()))
}
