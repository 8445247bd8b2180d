use std::future::Future;

#[cfg(not(target_arch = "wasm32"))]
use reqwest::Response;

#[cfg(not(target_arch = "wasm32"))]
use crate::errors::{ServiceError, StorageError};

/// Convert non-2xx responses into a structured error that includes the server body.
///
/// If the status is successful (2xx), the original response is returned.
/// If the status is an error (4xx or 5xx), the response body is consumed
/// to create a `StorageError::Service(ServiceError::Server)` and returned as an `Err`.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) async fn check_http_status(response: Response) -> Result<Response, StorageError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let message = response.text().await.unwrap_or_else(|_| {
        status
            .canonical_reason()
            .unwrap_or("Unknown Error")
            .to_string()
    });

    Err(StorageError::from(ServiceError::Server {
        status: status.as_u16(),
        message,
    }))
}

/// Run `fut` in the background on the current runtime.
pub(crate) fn spawn<F>(fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    #[cfg(not(target_arch = "wasm32"))]
    tokio::spawn(fut);

    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_futures::spawn_local(fut);
}
