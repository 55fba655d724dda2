#![allow(clippy::unwrap_used)]
// Termination rules of the page sweep.

mod common;

use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use xiqsync_api::{DEVICES_PATH, Error, Paginator, SweepEnd};

use common::{RecordingSleeper, client, devices, mount_login, secs};

async fn mount_page(server: &MockServer, page: u32, body: Value) {
    Mock::given(method("GET"))
        .and(path("/devices"))
        .and(query_param("page", page.to_string()))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_short_last_page_ends_sweep() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1", 1).await;
    mount_page(&server, 0, json!({ "data": devices(0, 100) })).await;
    mount_page(&server, 1, json!({ "data": devices(100, 100) })).await;
    mount_page(&server, 2, json!({ "data": devices(200, 50) })).await;

    let sleeper = RecordingSleeper::default();
    let mut client = client(&server, &sleeper);
    let sweep = Paginator::new(&mut client)
        .fetch_all::<Value>(DEVICES_PATH, 100)
        .await
        .unwrap();

    assert_eq!(sweep.items.len(), 250);
    assert_eq!(sweep.requests, 3);
    assert!(matches!(sweep.end, SweepEnd::ShortPage));
    assert_eq!(sweep.items[249]["hostname"], "ap-0249");
    assert_eq!(sleeper.slept(), vec![secs(3), secs(3)]);
}

#[tokio::test]
async fn test_empty_page_after_full_page_ends_sweep() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1", 1).await;
    mount_page(&server, 0, json!({ "data": devices(0, 100) })).await;
    mount_page(&server, 1, json!({ "data": [] })).await;

    let sleeper = RecordingSleeper::default();
    let mut client = client(&server, &sleeper);
    let sweep = Paginator::new(&mut client)
        .fetch_all::<Value>(DEVICES_PATH, 100)
        .await
        .unwrap();

    assert_eq!(sweep.items.len(), 100);
    assert_eq!(sweep.requests, 2);
    assert!(matches!(sweep.end, SweepEnd::Drained));
    assert!(sweep.end.is_complete());
}

#[tokio::test]
async fn test_missing_data_key_reads_as_empty() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1", 1).await;
    mount_page(&server, 0, json!({ "total_count": 0 })).await;

    let sleeper = RecordingSleeper::default();
    let mut client = client(&server, &sleeper);
    let sweep = Paginator::new(&mut client)
        .fetch_all::<Value>(DEVICES_PATH, 100)
        .await
        .unwrap();

    assert!(sweep.items.is_empty());
    assert!(matches!(sweep.end, SweepEnd::Drained));
}

#[tokio::test]
async fn test_non_list_payload_keeps_earlier_pages() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1", 1).await;
    mount_page(&server, 0, json!({ "data": devices(0, 100) })).await;
    mount_page(&server, 1, json!({ "data": { "error": "unexpected" } })).await;

    let sleeper = RecordingSleeper::default();
    let mut client = client(&server, &sleeper);
    let sweep = Paginator::new(&mut client)
        .fetch_all::<Value>(DEVICES_PATH, 100)
        .await
        .unwrap();

    assert_eq!(sweep.items.len(), 100);
    assert_eq!(sweep.requests, 2);
    match sweep.end {
        SweepEnd::Aborted(Error::MalformedResponse { ref message, .. }) => {
            assert!(message.contains("an object"), "got: {message}");
        }
        ref other => panic!("expected malformed abort, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1", 1).await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::default();
    let mut client = client(&server, &sleeper);
    let sweep = Paginator::new(&mut client)
        .fetch_all::<Value>(DEVICES_PATH, 100)
        .await
        .unwrap();

    assert!(sweep.items.is_empty());
    assert!(matches!(
        sweep.end,
        SweepEnd::Aborted(Error::MalformedResponse { .. })
    ));
}

#[tokio::test]
async fn test_request_failure_keeps_partial_results() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1", 1).await;
    mount_page(&server, 0, json!({ "data": devices(0, 100) })).await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::default();
    let mut client = client(&server, &sleeper);
    let sweep = Paginator::new(&mut client)
        .fetch_all::<Value>(DEVICES_PATH, 100)
        .await
        .unwrap();

    assert_eq!(sweep.items.len(), 100);
    assert!(matches!(
        sweep.end,
        SweepEnd::Aborted(Error::Request {
            status: Some(503),
            ..
        })
    ));
    assert!(!sweep.end.is_complete());
}

#[tokio::test]
async fn test_authentication_failure_is_escalated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::default();
    let mut client = client(&server, &sleeper);
    let result = Paginator::new(&mut client)
        .fetch_all::<Value>(DEVICES_PATH, 100)
        .await;

    assert!(matches!(result, Err(Error::Authentication { .. })));
}

#[tokio::test]
async fn test_custom_page_delay() {
    let server = MockServer::start().await;
    mount_login(&server, "tok-1", 1).await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .and(query_param("page", "0"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": devices(0, 2) })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": devices(2, 1) })))
        .mount(&server)
        .await;

    let sleeper = RecordingSleeper::default();
    let mut client = client(&server, &sleeper);
    let sweep = Paginator::new(&mut client)
        .with_page_delay(secs(1))
        .fetch_all::<Value>(DEVICES_PATH, 2)
        .await
        .unwrap();

    assert_eq!(sweep.items.len(), 3);
    assert_eq!(sleeper.slept(), vec![secs(1)]);
}
