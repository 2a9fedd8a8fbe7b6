// tests/request_list.rs

mod common;

use std::time::Duration;

use bytes::Bytes;
use serde_json::{json, Value};
use tokio::time::Instant;

use common::{init_logging, stream, FakeService, Reply};
use connect_client::{
    //
    subjects::rpc_subject,
    ConnectError,
    RequestOptions,
    Result,
    Subject,
};

fn list_subject() -> Subject {
    rpc_subject(common::ACCOUNT, "THINGS.LIST")
}

/// Run a listing and record every handler call.
async fn collect_calls(
    service: &FakeService,
    opts: RequestOptions,
) -> (Vec<(Option<Bytes>, bool)>, Result<()>) {
    // ---
    let client = service.client().await;
    let mut calls = Vec::new();

    let result = client
        .rpc()
        .request_list(&list_subject(), &json!({}), opts, |item, has_more| {
            calls.push((item, has_more));
            Ok(())
        })
        .await;

    (calls, result)
}

#[tokio::test]
async fn test_empty_list_calls_handler_once() {
    // ---
    init_logging();
    let service = FakeService::start(|_, _| stream::<Value>(&[])).await;

    let (calls, result) = collect_calls(&service, RequestOptions::default()).await;

    result.unwrap();
    assert_eq!(calls, vec![(None, false)]);

    service.shutdown().await;
}

#[tokio::test]
async fn test_items_arrive_in_order() {
    // ---
    init_logging();
    let service = FakeService::start(|_, _| stream(&["A", "B", "C"])).await;

    let (calls, result) = collect_calls(&service, RequestOptions::default()).await;

    result.unwrap();
    assert_eq!(
        calls,
        vec![
            (Some(Bytes::from_static(b"\"A\"")), true),
            (Some(Bytes::from_static(b"\"B\"")), true),
            (Some(Bytes::from_static(b"\"C\"")), false),
        ]
    );

    service.shutdown().await;
}

#[tokio::test]
async fn test_service_error_stops_stream() {
    // ---
    init_logging();
    let service = FakeService::start(|_, _| {
        vec![
            Reply::json(&"A").more(true),
            Reply::json(&"B").more(true),
            Reply::service_error("listing aborted", 503),
            Reply::json(&"never").more(false),
        ]
    })
    .await;

    let (calls, result) = collect_calls(&service, RequestOptions::default()).await;

    assert_eq!(calls.len(), 2);
    match result {
        Err(ConnectError::Service { message, code }) => {
            assert_eq!(message, "listing aborted");
            assert_eq!(code, 503);
        }
        other => panic!("expected service error, got {other:?}"),
    }

    service.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_per_message() {
    // ---
    let service = FakeService::start(|_, _| {
        // Message 1 after 150ms, then the stream stalls.
        let first = Reply::json(&"A").more(true);
        vec![first.after(Duration::from_millis(150))]
    })
    .await;

    let opts = RequestOptions::with_timeout(Duration::from_millis(200));
    let start = Instant::now();
    let (calls, result) = collect_calls(&service, opts).await;
    let elapsed = start.elapsed();

    assert_eq!(calls.len(), 1);
    assert!(matches!(result, Err(ConnectError::Timeout)));

    // One window after message 1, not one window after the call started.
    assert!(
        elapsed >= Duration::from_millis(350),
        "timed out too early: {elapsed:?}"
    );
    assert!(
        elapsed < Duration::from_millis(400),
        "timed out too late: {elapsed:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_stream_within_window_completes() {
    // ---
    let service = FakeService::start(|_, _| {
        let gap = Duration::from_millis(150);
        (0..5)
            .map(|i| Reply::json(&i).more(i < 4).after(gap))
            .collect()
    })
    .await;

    let opts = RequestOptions::with_timeout(Duration::from_millis(200));
    let (calls, result) = collect_calls(&service, opts).await;

    result.unwrap();
    assert_eq!(calls.len(), 5);
}

#[tokio::test]
async fn test_handler_error_stops_stream() {
    // ---
    init_logging();
    let service = FakeService::start(|_, _| stream(&[1, 2, 3, 4])).await;
    let client = service.client().await;

    let opts = RequestOptions::default();
    let mut seen = Vec::new();
    let result = client
        .rpc()
        .request_list_json(&list_subject(), &json!({}), opts, |item: Option<u32>, _| {
            let item = item.unwrap();
            seen.push(item);
            if item == 2 {
                return Err(ConnectError::Transport("enough".into()));
            }
            Ok(())
        })
        .await;

    match result {
        Err(ConnectError::Transport(reason)) => assert_eq!(reason, "enough"),
        other => panic!("expected the handler's error, got {other:?}"),
    }
    assert_eq!(seen, vec![1, 2]);

    service.shutdown().await;
}

#[tokio::test]
async fn test_undecodable_item_stops_typed_stream() {
    // ---
    init_logging();
    let service = FakeService::start(|_, _| {
        vec![
            Reply::json(&1).more(true),
            Reply::raw(b"{oops").more(true),
            Reply::json(&3).more(false),
        ]
    })
    .await;
    let client = service.client().await;

    let opts = RequestOptions::default();
    let mut seen = Vec::new();
    let result = client
        .rpc()
        .request_list_json(&list_subject(), &json!({}), opts, |item: Option<u32>, _| {
            seen.extend(item);
            Ok(())
        })
        .await;

    assert!(matches!(result, Err(ConnectError::Decode(_))));
    assert_eq!(seen, vec![1]);

    service.shutdown().await;
}

#[tokio::test]
async fn test_missing_has_more_header_ends_stream() {
    // ---
    init_logging();
    let service = FakeService::start(|_, _| {
        vec![Reply::json(&"only"), Reply::json(&"ignored")]
    })
    .await;

    let (calls, result) = collect_calls(&service, RequestOptions::default()).await;

    result.unwrap();
    assert_eq!(calls, vec![(Some(Bytes::from_static(b"\"only\"")), false)]);

    service.shutdown().await;
}

#[tokio::test]
async fn test_request_body_reaches_service() {
    // ---
    init_logging();
    let service = FakeService::start(|_, _| stream::<Value>(&[])).await;
    let client = service.client().await;

    let body = json!({"filter": "x"});
    let opts = RequestOptions::default();
    client
        .rpc()
        .request_list(&list_subject(), &body, opts, |_, _| Ok(()))
        .await
        .unwrap();

    let received = service.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].op, "THINGS.LIST");
    assert_eq!(received[0].body, json!({"filter": "x"}));

    service.shutdown().await;
}
