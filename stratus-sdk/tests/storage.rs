use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use httpmock::prelude::*;
use stratus::{
    AccessLevel, Capsule, ConfigToml, DownloadInput, GetUrlInput, Hub, Stratus, TransferState,
    UploadInput,
};

fn stratus_for(server: &MockServer, hub: &Hub) -> Stratus {
    let config = ConfigToml::from_str_with_defaults(&format!(
        r#"
        [storage]
        bucket = "photos"
        endpoint = "{}"
        identity_id = "me"
        chunk_size = 4
        "#,
        server.base_url()
    ))
    .unwrap();
    Stratus::from_config(config).unwrap().with_hub(hub.clone())
}

fn storage_events(hub: &Hub) -> Arc<Mutex<Vec<String>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let _off = hub.listen(
        "storage",
        move |capsule: &Capsule| {
            if capsule.source == "Storage" {
                sink.lock().unwrap().push(capsule.payload.event.clone());
            }
        },
        None,
    );
    events
}

#[tokio::test]
async fn download_over_http_reports_on_the_hub() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/photos/protected/me/cat.txt");
            then.status(200)
                .header("content-type", "text/plain")
                .header("etag", "\"c4t\"")
                .body("meow");
        })
        .await;

    let hub = Hub::new("http-download");
    let events = storage_events(&hub);
    let stratus = stratus_for(&server, &hub);

    let task = stratus
        .storage()
        .unwrap()
        .download(DownloadInput::new("cat.txt").access_level(AccessLevel::Protected))
        .unwrap();
    let cat = task.result().await.unwrap();

    mock.assert_async().await;
    assert_eq!(cat.body, "meow");
    assert_eq!(cat.etag.as_deref(), Some("\"c4t\""));
    assert_eq!(*events.lock().unwrap(), ["download"]);
}

#[tokio::test]
async fn failed_upload_reports_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/photos/public/denied.txt");
            then.status(403).body("AccessDenied");
        })
        .await;

    let hub = Hub::new("http-upload-failure");
    let events = storage_events(&hub);
    let stratus = stratus_for(&server, &hub);

    let err = stratus
        .storage()
        .unwrap()
        .upload(UploadInput::new("denied.txt", "nope"))
        .unwrap()
        .result()
        .await
        .unwrap_err();

    assert!(!err.is_cancel_error());
    assert!(err.to_string().contains("403"));
    assert_eq!(*events.lock().unwrap(), ["upload_failure"]);
}

#[tokio::test]
async fn paused_upload_sends_nothing_until_resumed() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/photos/public/notes.txt")
                .body("pause me please");
            then.status(200).header("etag", "\"n1\"");
        })
        .await;

    let hub = Hub::new("http-upload-pause");
    let stratus = stratus_for(&server, &hub);

    let task = stratus
        .storage()
        .unwrap()
        .upload_resumable(UploadInput::new("notes.txt", "pause me please"))
        .unwrap();
    assert!(task.pause());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(task.state(), TransferState::Paused);
    assert_eq!(mock.hits_async().await, 0);

    assert!(task.resume());
    let output = task.result().await.unwrap();
    assert_eq!(output.etag.as_deref(), Some("\"n1\""));
    assert_eq!(output.size, 15);
    mock.assert_async().await;
}

#[tokio::test]
async fn cancel_is_idempotent_and_silent() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/photos/public/slow.bin");
            then.status(200).delay(Duration::from_secs(5)).body("late");
        })
        .await;

    let hub = Hub::new("http-cancel");
    let events = storage_events(&hub);
    let stratus = stratus_for(&server, &hub);

    let task = stratus
        .storage()
        .unwrap()
        .download_resumable(DownloadInput::new("slow.bin"))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(task.cancel(Some("user navigated away")));
    assert!(!task.cancel(None));

    let err = tokio::time::timeout(Duration::from_secs(2), task.result())
        .await
        .expect("cancel should settle the task promptly")
        .unwrap_err();
    assert!(stratus::is_cancel_error(&err));
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn validation_fails_before_any_request() {
    let server = MockServer::start_async().await;
    let hub = Hub::new("http-validation");
    let stratus = stratus_for(&server, &hub);
    let storage = stratus.storage().unwrap();

    assert!(storage.download(DownloadInput::new("")).is_err());
    assert!(storage
        .download(
            DownloadInput::new("a")
                .access_level(AccessLevel::Guest)
                .target_identity_id("them")
        )
        .is_err());
    assert!(storage
        .get_url(GetUrlInput::new("a").expires_in(Duration::ZERO))
        .is_err());
}

#[tokio::test]
async fn urls_point_at_the_endpoint() {
    let server = MockServer::start_async().await;
    let hub = Hub::new("http-urls");
    let stratus = stratus_for(&server, &hub);

    let output = stratus
        .storage()
        .unwrap()
        .get_url(GetUrlInput::new("cat.txt").access_level(AccessLevel::Private))
        .unwrap();
    assert_eq!(
        output.url.as_str(),
        format!("{}/photos/private/me/cat.txt", server.base_url())
    );
}
