use std::{collections::HashMap, pin::pin, time::Duration};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::{stream, StreamExt};
use reqwest::{
    header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE, ETAG, LAST_MODIFIED},
    Body, Client,
};
use stratus_core::cross_log;
use url::Url;

use super::{
    chunks, GetObjectOutput, GetObjectRequest, Progress, PutObjectOutput, PutObjectRequest,
    StorageProvider,
};
use crate::{
    errors::{ServiceError, StorageError},
    transfer::TransferControl,
    util::check_http_status,
};

const VERSION_ID: &str = "x-amz-version-id";
const PREALLOCATED_CHUNKS: usize = 16;
const META_PREFIX: &str = "x-amz-meta-";

/// Object store reachable over plain HTTP, addressed path-style as
/// `{endpoint}/{bucket}/{key}`.
///
/// Requests are unsigned: this fits public buckets, S3-compatible gateways that
/// authenticate upstream, and local test servers.
#[derive(Debug, Clone)]
pub struct HttpStorageProvider {
    http: Client,
    endpoint: Url,
}

impl HttpStorageProvider {
    /// Provider for `endpoint` with a default `reqwest` client.
    ///
    /// # Errors
    /// - [`ServiceError::Transport`] if the HTTP client cannot be built.
    pub fn new(endpoint: Url) -> Result<Self, StorageError> {
        let http = Client::builder()
            .user_agent(concat!("stratus-storage/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(http, endpoint))
    }

    /// Provider sharing an existing client (connection pool, proxies, TLS settings).
    pub fn with_client(http: Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn url_for(&self, bucket: &str, key: &str) -> Result<Url, StorageError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ServiceError::Provider(format!("endpoint {} cannot be a base URL", self.endpoint))
            })?
            .pop_if_empty()
            .push(bucket)
            .extend(key.split('/'));
        Ok(url)
    }
}

#[async_trait]
impl StorageProvider for HttpStorageProvider {
    async fn get_object(
        &self,
        request: GetObjectRequest,
        control: &TransferControl,
    ) -> Result<GetObjectOutput, StorageError> {
        let url = self.url_for(&request.bucket, &request.key)?;
        control.checkpoint().await?;
        cross_log!(debug, "GET {}", url);

        let response = control.or_canceled(self.http.get(url).send()).await??;
        let response = check_http_status(response).await?;

        let headers = response.headers();
        let content_length = response.content_length();
        let mut output = GetObjectOutput {
            body: Bytes::new(),
            last_modified: header_str(headers, LAST_MODIFIED.as_str())
                .and_then(|value| httpdate::parse_http_date(value).ok()),
            content_length,
            etag: header_string(headers, ETAG.as_str()),
            metadata: metadata(headers),
            version_id: header_string(headers, VERSION_ID),
            content_type: header_string(headers, CONTENT_TYPE.as_str()),
        };

        let mut progress = Progress::new(request.on_progress, content_length);
        let mut body = BytesMut::with_capacity(initial_capacity(content_length, request.chunk_size));
        let mut chunks = pin!(response.bytes_stream());
        while let Some(chunk) = control.or_canceled(chunks.next()).await? {
            let chunk = chunk?;
            control.checkpoint().await?;
            body.extend_from_slice(&chunk);
            progress.advance(chunk.len());
        }

        output.body = body.freeze();
        if output.content_length.is_none() {
            output.content_length = Some(output.body.len() as u64);
        }
        Ok(output)
    }

    async fn put_object(
        &self,
        request: PutObjectRequest,
        control: &TransferControl,
    ) -> Result<PutObjectOutput, StorageError> {
        let url = self.url_for(&request.bucket, &request.key)?;
        control.checkpoint().await?;
        cross_log!(debug, "PUT {}", url);

        let size = request.body.len() as u64;
        let progress = Progress::new(request.on_progress, Some(size));
        let pending = chunks(&request.body, request.chunk_size).into_iter();

        // Each chunk passes a checkpoint before it is handed to the connection, so a
        // paused upload stops sending and a canceled one aborts the request body.
        let body = stream::unfold(
            (pending, control.clone(), progress),
            |(mut pending, control, mut progress)| async move {
                let chunk = pending.next()?;
                match control.checkpoint().await {
                    Ok(()) => {
                        progress.advance(chunk.len());
                        Some((Ok(chunk), (pending, control, progress)))
                    }
                    Err(err) => Some((Err(err), (Vec::new().into_iter(), control, progress))),
                }
            },
        );

        let mut builder = self
            .http
            .put(url)
            .header(CONTENT_LENGTH, size)
            .body(Body::wrap_stream(body));
        if let Some(content_type) = &request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        for (name, value) in &request.metadata {
            builder = builder.header(format!("{META_PREFIX}{name}"), value);
        }

        let response = control.or_canceled(builder.send()).await??;
        let response = check_http_status(response).await?;

        let headers = response.headers();
        Ok(PutObjectOutput {
            etag: header_string(headers, ETAG.as_str()),
            version_id: header_string(headers, VERSION_ID),
        })
    }

    /// The plain object URL. It stays valid as long as the object is publicly
    /// readable, so `expires_in` only bounds what callers are told.
    fn object_url(
        &self,
        bucket: &str,
        key: &str,
        _expires_in: Duration,
    ) -> Result<Url, StorageError> {
        self.url_for(bucket, key)
    }
}

/// Buffer size to start a download with. `Content-Length` is only trusted up to a
/// few chunks; the buffer grows as the body arrives.
fn initial_capacity(content_length: Option<u64>, chunk_size: usize) -> usize {
    let cap = chunk_size.saturating_mul(PREALLOCATED_CHUNKS);
    content_length
        .and_then(|len| usize::try_from(len).ok())
        .map_or(0, |len| len.min(cap))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    header_str(headers, name).map(str::to_string)
}

/// User metadata from `x-amz-meta-*` headers, keyed without the prefix.
fn metadata(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let key = name.as_str().strip_prefix(META_PREFIX)?;
            Some((key.to_string(), value.to_str().ok()?.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use httpmock::prelude::*;

    use super::*;
    use crate::{provider::ProgressCallback, transfer::TransferTask};

    fn provider(server: &MockServer) -> HttpStorageProvider {
        HttpStorageProvider::new(Url::parse(&server.base_url()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn get_object_maps_headers_and_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/photos/public/cat.txt");
                then.status(200)
                    .header("content-type", "text/plain")
                    .header("etag", "\"abc\"")
                    .header("last-modified", "Wed, 21 Oct 2015 07:28:00 GMT")
                    .header("x-amz-version-id", "v7")
                    .header("x-amz-meta-owner", "me")
                    .body("meow meow");
            })
            .await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let provider = provider(&server);
        let task = TransferTask::spawn(move |control| async move {
            let request = GetObjectRequest {
                bucket: "photos".into(),
                key: "public/cat.txt".into(),
                chunk_size: 4,
                on_progress: Some(ProgressCallback::new(move |p| {
                    sink.lock().unwrap().push(p.transferred_bytes)
                })),
            };
            provider.get_object(request, &control).await
        });

        let output = task.result().await.unwrap();
        mock.assert_async().await;

        assert_eq!(output.body, "meow meow");
        assert_eq!(output.content_length, Some(9));
        assert_eq!(output.content_type.as_deref(), Some("text/plain"));
        assert_eq!(output.etag.as_deref(), Some("\"abc\""));
        assert_eq!(output.version_id.as_deref(), Some("v7"));
        assert_eq!(output.metadata["owner"], "me");
        assert_eq!(
            output.last_modified,
            Some(httpdate::parse_http_date("Wed, 21 Oct 2015 07:28:00 GMT").unwrap())
        );
        assert_eq!(seen.lock().unwrap().last(), Some(&9));
    }

    #[tokio::test]
    async fn error_statuses_become_service_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/photos/public/missing");
                then.status(404).body("NoSuchKey");
            })
            .await;

        let provider = provider(&server);
        let task = TransferTask::spawn(move |control| async move {
            let request = GetObjectRequest {
                bucket: "photos".into(),
                key: "public/missing".into(),
                chunk_size: 4,
                on_progress: None,
            };
            provider.get_object(request, &control).await
        });

        match task.result().await.unwrap_err() {
            StorageError::Service(ServiceError::Server { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "NoSuchKey");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn put_object_sends_body_and_metadata() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/photos/public/notes.txt")
                    .header("content-type", "text/plain")
                    .header("x-amz-meta-owner", "me")
                    .body("some notes");
                then.status(200)
                    .header("etag", "\"e1\"")
                    .header("x-amz-version-id", "v1");
            })
            .await;

        let provider = provider(&server);
        let task = TransferTask::spawn(move |control| async move {
            let request = PutObjectRequest {
                bucket: "photos".into(),
                key: "public/notes.txt".into(),
                body: Bytes::from_static(b"some notes"),
                content_type: Some("text/plain".into()),
                metadata: HashMap::from([("owner".to_string(), "me".to_string())]),
                chunk_size: 3,
                on_progress: None,
            };
            provider.put_object(request, &control).await
        });

        let output = task.result().await.unwrap();
        mock.assert_async().await;
        assert_eq!(output.etag.as_deref(), Some("\"e1\""));
        assert_eq!(output.version_id.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn canceling_interrupts_a_slow_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/photos/public/slow");
                then.status(200)
                    .delay(Duration::from_secs(5))
                    .body("late");
            })
            .await;

        let provider = provider(&server);
        let task = TransferTask::spawn(move |control| async move {
            let request = GetObjectRequest {
                bucket: "photos".into(),
                key: "public/slow".into(),
                chunk_size: 4,
                on_progress: None,
            };
            provider.get_object(request, &control).await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(task.cancel(Some("too slow")));

        let err = tokio::time::timeout(Duration::from_secs(2), task.result())
            .await
            .expect("cancel should not wait for the response")
            .unwrap_err();
        assert!(err.is_cancel_error());
    }

    #[test]
    fn announced_lengths_only_preallocate_a_few_chunks() {
        assert_eq!(initial_capacity(Some(100), 64), 100);
        assert_eq!(initial_capacity(Some(4_398_046_511_104), 64), 64 * PREALLOCATED_CHUNKS);
        assert_eq!(initial_capacity(None, 64), 0);
    }

    #[test]
    fn object_urls_are_path_style() {
        let provider =
            HttpStorageProvider::new(Url::parse("https://store.example.com/base/").unwrap())
                .unwrap();
        let url = provider
            .object_url("photos", "public/a b.txt", Duration::from_secs(60))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://store.example.com/base/photos/public/a%20b.txt"
        );
    }
}
