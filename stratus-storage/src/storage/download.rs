use std::sync::Arc;
#[cfg(not(target_arch = "wasm32"))]
use std::path::PathBuf;

use stratus_core::{cross_log, Hub};

#[cfg(not(target_arch = "wasm32"))]
use super::DownloadFileOutput;
use super::{reporter, DownloadInput, DownloadOutput, Operation, Storage};
use crate::{
    config::ObjectLocation,
    errors::StorageError,
    provider::{GetObjectRequest, ProgressCallback, StorageProvider},
    transfer::{ResumableTransferTask, TransferControl, TransferTask},
};

/// A validated download, ready to run.
struct Download {
    provider: Arc<dyn StorageProvider>,
    hub: Option<Hub>,
    location: ObjectLocation,
    key: String,
    chunk_size: usize,
    on_progress: Option<ProgressCallback>,
}

impl Download {
    async fn run(self, control: TransferControl) -> Result<DownloadOutput, StorageError> {
        self.fetch(&control).await
    }

    fn reporter<T: 'static>(&self) -> impl FnOnce(&Result<T, StorageError>) + Send + 'static {
        reporter(self.hub.clone(), Operation::Download, self.key.clone())
    }

    async fn fetch(&self, control: &TransferControl) -> Result<DownloadOutput, StorageError> {
        let request = GetObjectRequest {
            bucket: self.location.bucket.clone(),
            key: self.location.key.clone(),
            chunk_size: self.chunk_size,
            on_progress: self.on_progress.clone(),
        };
        let object = self.provider.get_object(request, control).await?;
        // A cancel that raced the last chunk still wins.
        control.check()?;

        Ok(DownloadOutput {
            key: self.key.clone(),
            size: object.content_length.or(Some(object.body.len() as u64)),
            body: object.body,
            last_modified: object.last_modified,
            content_type: object.content_type,
            etag: object.etag,
            metadata: object.metadata,
            version_id: object.version_id,
        })
    }
}

impl Storage {
    fn prepare_download(&self, input: DownloadInput) -> Result<Download, StorageError> {
        let location = self.config.resolve(
            &input.key,
            input.options.access_level,
            input.options.target_identity_id.as_deref(),
        )?;
        cross_log!(debug, "Downloading {} from {}", location.key, location.bucket);

        Ok(Download {
            provider: Arc::clone(&self.provider),
            hub: self.hub.clone(),
            location,
            key: input.key,
            chunk_size: self.config.chunk_size,
            on_progress: input.options.on_progress,
        })
    }

    /// Download an object into memory.
    ///
    /// # Errors
    /// - [`StorageError::Validation`] for invalid input, before any request is made.
    ///
    /// Failures of the transfer itself are reported by the task's `result`.
    pub fn download(
        &self,
        input: DownloadInput,
    ) -> Result<TransferTask<DownloadOutput>, StorageError> {
        let download = self.prepare_download(input)?;
        let on_settled = download.reporter();
        Ok(TransferTask::spawn_with(
            move |control| download.run(control),
            on_settled,
        ))
    }

    /// Like [`download`](Self::download), but the transfer can be paused and resumed.
    ///
    /// # Errors
    /// - [`StorageError::Validation`] for invalid input, before any request is made.
    pub fn download_resumable(
        &self,
        input: DownloadInput,
    ) -> Result<ResumableTransferTask<DownloadOutput>, StorageError> {
        let download = self.prepare_download(input)?;
        let on_settled = download.reporter();
        Ok(ResumableTransferTask::spawn_with(
            move |control| download.run(control),
            on_settled,
        ))
    }

    /// Download an object and write it to `path`, replacing any existing file.
    ///
    /// Nothing is written if the transfer is canceled before the body is complete.
    ///
    /// # Errors
    /// - [`StorageError::Validation`] for invalid input, before any request is made.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn download_file(
        &self,
        input: DownloadInput,
        path: impl Into<PathBuf>,
    ) -> Result<ResumableTransferTask<DownloadFileOutput>, StorageError> {
        let download = self.prepare_download(input)?;
        let on_settled = download.reporter();
        let path = path.into();

        let job = move |control: TransferControl| async move {
            let output = download.run(control.clone()).await?;
            control.checkpoint().await?;

            tokio::fs::write(&path, &output.body).await?;
            cross_log!(debug, "Saved {} to {}", output.key, path.display());

            Ok(DownloadFileOutput {
                key: output.key,
                path,
                size: output.body.len() as u64,
                etag: output.etag,
            })
        };
        Ok(ResumableTransferTask::spawn_with(job, on_settled))
    }
}
