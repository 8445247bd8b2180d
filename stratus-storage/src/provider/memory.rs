use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, PoisonError, RwLock,
    },
    time::{Duration, SystemTime},
};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use super::{
    chunks, GetObjectOutput, GetObjectRequest, Progress, PutObjectOutput, PutObjectRequest,
    StorageProvider,
};
use crate::{
    errors::{ServiceError, StorageError},
    transfer::TransferControl,
};

#[derive(Debug, Clone)]
struct StoredObject {
    body: Bytes,
    content_type: Option<String>,
    metadata: HashMap<String, String>,
    etag: String,
    version_id: String,
    last_modified: SystemTime,
}

/// A provider keeping objects in process memory.
///
/// Bodies are still moved chunk by chunk so pause and cancel behave as they would
/// against a remote store. Clones share the same objects.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    objects: Arc<RwLock<HashMap<(String, String), StoredObject>>>,
    versions: Arc<AtomicU64>,
}

impl InMemoryProvider {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `body` directly, bypassing any transfer.
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        self.store(bucket, key, body.into(), None, HashMap::new());
    }

    /// The stored body of an object, if any.
    pub fn get(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(bucket.to_string(), key.to_string()))
            .map(|object| object.body.clone())
    }

    /// Number of stored objects across all buckets.
    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn store(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<String>,
        metadata: HashMap<String, String>,
    ) -> StoredObject {
        let version = self.versions.fetch_add(1, Ordering::Relaxed) + 1;
        let object = StoredObject {
            body,
            content_type,
            metadata,
            etag: format!("\"{version:016x}\""),
            version_id: version.to_string(),
            last_modified: SystemTime::now(),
        };
        self.objects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((bucket.to_string(), key.to_string()), object.clone());
        object
    }
}

#[async_trait]
impl StorageProvider for InMemoryProvider {
    async fn get_object(
        &self,
        request: GetObjectRequest,
        control: &TransferControl,
    ) -> Result<GetObjectOutput, StorageError> {
        let object = self
            .objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(request.bucket.clone(), request.key.clone()))
            .cloned()
            .ok_or_else(|| ServiceError::Server {
                status: 404,
                message: format!("NoSuchKey: {}", request.key),
            })?;

        let size = object.body.len() as u64;
        let mut progress = Progress::new(request.on_progress, Some(size));
        for chunk in chunks(&object.body, request.chunk_size) {
            control.checkpoint().await?;
            progress.advance(chunk.len());
        }

        Ok(GetObjectOutput {
            body: object.body,
            last_modified: Some(object.last_modified),
            content_length: Some(size),
            etag: Some(object.etag),
            metadata: object.metadata,
            version_id: Some(object.version_id),
            content_type: object.content_type,
        })
    }

    async fn put_object(
        &self,
        request: PutObjectRequest,
        control: &TransferControl,
    ) -> Result<PutObjectOutput, StorageError> {
        let mut progress = Progress::new(request.on_progress, Some(request.body.len() as u64));
        for chunk in chunks(&request.body, request.chunk_size) {
            control.checkpoint().await?;
            progress.advance(chunk.len());
        }
        // The last chunk may have been sent while a cancel arrived.
        control.check()?;

        let object = self.store(
            &request.bucket,
            &request.key,
            request.body,
            request.content_type,
            request.metadata,
        );
        Ok(PutObjectOutput {
            etag: Some(object.etag),
            version_id: Some(object.version_id),
        })
    }

    fn object_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<Url, StorageError> {
        let mut url = Url::parse("memory://objects/")
            .map_err(|err| ServiceError::Provider(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| ServiceError::Provider("memory URL cannot be a base".into()))?
            .pop_if_empty()
            .push(bucket)
            .extend(key.split('/'));
        url.query_pairs_mut()
            .append_pair("expires", &expires_in.as_secs().to_string());
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::TransferTask;

    fn get(key: &str) -> GetObjectRequest {
        GetObjectRequest {
            bucket: "b".into(),
            key: key.into(),
            chunk_size: 2,
            on_progress: None,
        }
    }

    #[tokio::test]
    async fn stores_and_fetches_objects() {
        let provider = InMemoryProvider::new();
        let writer = provider.clone();
        let task = TransferTask::spawn(move |control| async move {
            let request = PutObjectRequest {
                bucket: "b".into(),
                key: "public/a.txt".into(),
                body: Bytes::from_static(b"hello"),
                content_type: Some("text/plain".into()),
                metadata: HashMap::from([("owner".to_string(), "me".to_string())]),
                chunk_size: 2,
                on_progress: None,
            };
            writer.put_object(request, &control).await
        });
        let put = task.result().await.unwrap();
        assert_eq!(put.version_id.as_deref(), Some("1"));

        let reader = provider.clone();
        let task = TransferTask::spawn(move |control| async move {
            reader.get_object(get("public/a.txt"), &control).await
        });
        let object = task.result().await.unwrap();
        assert_eq!(object.body, "hello");
        assert_eq!(object.content_length, Some(5));
        assert_eq!(object.content_type.as_deref(), Some("text/plain"));
        assert_eq!(object.metadata["owner"], "me");
        assert_eq!(object.etag, put.etag);
    }

    #[tokio::test]
    async fn missing_objects_are_not_found() {
        let provider = InMemoryProvider::new();
        let task = TransferTask::spawn(move |control| async move {
            provider.get_object(get("nope"), &control).await
        });
        match task.result().await.unwrap_err() {
            StorageError::Service(err) => assert!(err.is_not_found()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn object_urls_carry_bucket_key_and_expiry() {
        let url = InMemoryProvider::new()
            .object_url("b", "public/dir/a.txt", Duration::from_secs(60))
            .unwrap();
        assert_eq!(url.as_str(), "memory://objects/b/public/dir/a.txt?expires=60");
    }
}
