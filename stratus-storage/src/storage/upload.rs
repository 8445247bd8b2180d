use std::{collections::HashMap, sync::Arc};

use bytes::Bytes;
use stratus_core::{cross_log, Hub};

use super::{reporter, Operation, Storage, UploadData, UploadInput, UploadOutput};
use crate::{
    config::ObjectLocation,
    errors::{StorageError, ValidationError, MAX_OBJECT_SIZE},
    provider::{ProgressCallback, PutObjectRequest, StorageProvider},
    transfer::{ResumableTransferTask, TransferControl, TransferTask},
};

/// A validated upload, ready to run.
struct Upload {
    provider: Arc<dyn StorageProvider>,
    hub: Option<Hub>,
    location: ObjectLocation,
    key: String,
    data: UploadData,
    content_type: String,
    metadata: HashMap<String, String>,
    chunk_size: usize,
    on_progress: Option<ProgressCallback>,
}

impl Upload {
    async fn run(self, control: TransferControl) -> Result<UploadOutput, StorageError> {
        self.send(&control).await
    }

    fn reporter(&self) -> impl FnOnce(&Result<UploadOutput, StorageError>) + Send + 'static {
        reporter(self.hub.clone(), Operation::Upload, self.key.clone())
    }

    async fn send(&self, control: &TransferControl) -> Result<UploadOutput, StorageError> {
        let body = self.body(control).await?;
        let size = body.len() as u64;
        check_size(size)?;

        let request = PutObjectRequest {
            bucket: self.location.bucket.clone(),
            key: self.location.key.clone(),
            body,
            content_type: Some(self.content_type.clone()),
            metadata: self.metadata.clone(),
            chunk_size: self.chunk_size,
            on_progress: self.on_progress.clone(),
        };
        let stored = self.provider.put_object(request, control).await?;
        control.check()?;

        Ok(UploadOutput {
            key: self.key.clone(),
            etag: stored.etag,
            version_id: stored.version_id,
            content_type: Some(self.content_type.clone()),
            size,
            metadata: self.metadata.clone(),
        })
    }

    #[cfg_attr(target_arch = "wasm32", allow(unused_variables))]
    async fn body(&self, control: &TransferControl) -> Result<Bytes, StorageError> {
        match &self.data {
            UploadData::Bytes(bytes) => Ok(bytes.clone()),
            UploadData::Text(text) => Ok(Bytes::from(text.clone())),
            #[cfg(not(target_arch = "wasm32"))]
            UploadData::File(path) => {
                control.checkpoint().await?;
                let contents = control.or_canceled(tokio::fs::read(path)).await??;
                Ok(Bytes::from(contents))
            }
        }
    }
}

fn check_size(size: u64) -> Result<(), ValidationError> {
    if size > MAX_OBJECT_SIZE {
        return Err(ValidationError::ObjectTooLarge { size });
    }
    Ok(())
}

impl Storage {
    fn prepare_upload(&self, input: UploadInput) -> Result<Upload, StorageError> {
        let location = self
            .config
            .resolve(&input.key, input.options.access_level, None)?;
        if let Some(size) = input.data.known_size() {
            check_size(size)?;
        }
        cross_log!(debug, "Uploading {} to {}", location.key, location.bucket);

        let content_type = input
            .options
            .content_type
            .unwrap_or_else(|| input.data.default_content_type().to_string());

        Ok(Upload {
            provider: Arc::clone(&self.provider),
            hub: self.hub.clone(),
            location,
            key: input.key,
            data: input.data,
            content_type,
            metadata: input.options.metadata,
            chunk_size: self.config.chunk_size,
            on_progress: input.options.on_progress,
        })
    }

    /// Upload an object.
    ///
    /// Files are read when the transfer starts, so an unreadable file rejects the
    /// task rather than this call.
    ///
    /// # Errors
    /// - [`StorageError::Validation`] for invalid input or an oversized payload,
    ///   before any request is made.
    pub fn upload(&self, input: UploadInput) -> Result<TransferTask<UploadOutput>, StorageError> {
        let upload = self.prepare_upload(input)?;
        let on_settled = upload.reporter();
        Ok(TransferTask::spawn_with(
            move |control| upload.run(control),
            on_settled,
        ))
    }

    /// Like [`upload`](Self::upload), but the transfer can be paused and resumed.
    ///
    /// # Errors
    /// - [`StorageError::Validation`] for invalid input or an oversized payload,
    ///   before any request is made.
    pub fn upload_resumable(
        &self,
        input: UploadInput,
    ) -> Result<ResumableTransferTask<UploadOutput>, StorageError> {
        let upload = self.prepare_upload(input)?;
        let on_settled = upload.reporter();
        Ok(ResumableTransferTask::spawn_with(
            move |control| upload.run(control),
            on_settled,
        ))
    }
}
