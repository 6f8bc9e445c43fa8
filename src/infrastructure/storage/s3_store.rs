use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, RetryConfig};

use crate::application::ports::{AudioStore, AudioStoreError};

use super::fetch_object;

/// S3-compatible store (MinIO in the reference deployment).
///
/// `object_store` clients are bound to one bucket. Bucket names arrive from
/// callers, so a client is only kept once a fetch through it has succeeded.
pub struct S3AudioStore {
    endpoint: String,
    access_key: String,
    secret_key: String,
    region: String,
    use_ssl: bool,
    retry: RetryConfig,
    clients: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl S3AudioStore {
    pub fn new(
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
        region: &str,
        use_ssl: bool,
    ) -> Self {
        Self {
            endpoint: normalize_endpoint(endpoint, use_ssl),
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            region: region.to_string(),
            use_ssl,
            retry: RetryConfig::default(),
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn cached_client(&self, bucket: &str) -> Option<Arc<dyn ObjectStore>> {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(bucket)
            .cloned()
    }

    fn build_client(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, AudioStoreError> {
        let store = AmazonS3Builder::new()
            .with_endpoint(&self.endpoint)
            .with_access_key_id(&self.access_key)
            .with_secret_access_key(&self.secret_key)
            .with_region(&self.region)
            .with_bucket_name(bucket)
            .with_allow_http(!self.use_ssl)
            .with_retry(self.retry.clone())
            .build()
            .map_err(|e| AudioStoreError::Unavailable(e.to_string()))?;

        tracing::debug!(endpoint = %self.endpoint, bucket, "Created object store client");
        Ok(Arc::new(store))
    }

    fn remember(&self, bucket: &str, client: Arc<dyn ObjectStore>) {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(bucket.to_string())
            .or_insert(client);
    }
}

#[async_trait::async_trait]
impl AudioStore for S3AudioStore {
    async fn get_object(&self, bucket: &str, name: &str) -> Result<Bytes, AudioStoreError> {
        let path =
            StorePath::parse(name).map_err(|e| AudioStoreError::InvalidKey(e.to_string()))?;

        if let Some(client) = self.cached_client(bucket) {
            return fetch_object(client.as_ref(), &path).await;
        }

        let client = self.build_client(bucket)?;
        let bytes = fetch_object(client.as_ref(), &path).await?;
        self.remember(bucket, client);
        Ok(bytes)
    }
}

fn normalize_endpoint(endpoint: &str, use_ssl: bool) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else if use_ssl {
        format!("https://{}", endpoint)
    } else {
        format!("http://{}", endpoint)
    }
}
