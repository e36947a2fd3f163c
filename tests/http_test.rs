//! HTTP helper against an in-process axum server

use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header},
    routing::{get, post},
};
use serde_json::json;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use toolbelt::config::{ByteSize, HttpConfig};
use toolbelt::http::{Body, HttpClient, HttpError, RequestOptions, ResponseBody};
use toolbelt::observability::Metrics;
use toolbelt::ErrorKind;

async fn start_mock_server() -> String {
    let app = Router::new()
        .route(
            "/a",
            get(|| async { ([(header::CONTENT_TYPE, "application/json")], r#"{"k":1}"#) }),
        )
        .route(
            "/plain",
            get(|| async { ([(header::CONTENT_TYPE, "text/plain")], "not json") }),
        )
        .route(
            "/mislabelled",
            get(|| async { ([(header::CONTENT_TYPE, "text/plain")], "[1,2]") }),
        )
        .route(
            "/echo",
            post(|headers: HeaderMap, body: String| async move {
                let content_type = headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                Json(json!({"content_type": content_type, "body": body}))
            }),
        )
        .route(
            "/query",
            get(
                |axum::extract::Query(params): axum::extract::Query<BTreeMap<String, String>>,
                 headers: HeaderMap| async move {
                    let token = headers
                        .get("x-token")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    Json(json!({"params": params, "token": token}))
                },
            ),
        )
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, "gone") }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        )
        .route("/big", get(|| async { "x".repeat(4096) }));

    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let bound_addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", bound_addr)
}

fn client() -> HttpClient {
    HttpClient::new(&HttpConfig::default()).unwrap()
}

#[tokio::test]
async fn test_get_structured_body() {
    let base = start_mock_server().await;

    let response = client()
        .get(&format!("{base}/a"), RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert!(response.is_structured_media());
    assert_eq!(response.body, ResponseBody::Json(json!({"k": 1})));
}

#[tokio::test]
async fn test_get_unparseable_body_is_text() {
    let base = start_mock_server().await;

    let response = client()
        .get(&format!("{base}/plain"), RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, ResponseBody::Text("not json".to_string()));
}

#[tokio::test]
async fn test_json_text_parsed_regardless_of_content_type() {
    let base = start_mock_server().await;

    let response = client()
        .get(&format!("{base}/mislabelled"), RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(response.json(), Some(&json!([1, 2])));
}

#[tokio::test]
async fn test_params_and_headers_are_sent() {
    let base = start_mock_server().await;

    let options = RequestOptions::new()
        .param("q", "rust lang")
        .param("page", "2")
        .header("X-Token", "secret");
    let response = client()
        .get(&format!("{base}/query"), options)
        .await
        .unwrap();

    assert_eq!(
        response.json(),
        Some(&json!({"params": {"page": "2", "q": "rust lang"}, "token": "secret"}))
    );
}

#[tokio::test]
async fn test_post_json_sets_content_type() {
    let base = start_mock_server().await;
    let url = format!("{base}/echo");

    let structured = client()
        .post(&url, Some(Body::Json(json!({"a": 1}))), RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(
        structured.json(),
        Some(&json!({"content_type": "application/json", "body": "{\"a\":1}"}))
    );

    let text = client()
        .post(&url, Some(Body::from("plain words")), RequestOptions::new())
        .await
        .unwrap();
    assert_eq!(
        text.json(),
        Some(&json!({"content_type": "", "body": "plain words"}))
    );
}

#[tokio::test]
async fn test_error_status_is_a_response() {
    let base = start_mock_server().await;

    let response = client()
        .get(&format!("{base}/missing"), RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(response.status, 404);
    assert!(!response.is_success());
    assert_eq!(response.text(), Some("gone"));
}

#[tokio::test]
async fn test_timeout_is_transport_sub_kind() {
    let base = start_mock_server().await;

    let err = client()
        .get(
            &format!("{base}/slow"),
            RequestOptions::new().timeout(Duration::from_millis(100)),
        )
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.kind().is_transport());
}

#[tokio::test]
async fn test_connection_refused_is_transport() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client()
        .get(&format!("http://{addr}/"), RequestOptions::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn test_invalid_urls_fail_before_io() {
    let metrics = Arc::new(Metrics::new());
    let client = client().with_metrics(metrics.clone());

    for url in ["", "   ", "not a url", "ftp://example.test/file"] {
        let err = client.get(url, RequestOptions::new()).await.unwrap_err();
        assert!(
            matches!(err, HttpError::InvalidArgument(_)),
            "{url:?} gave {err:?}"
        );
    }

    assert_eq!(metrics.snapshot().http_requests, 0);
}

#[tokio::test]
async fn test_base_url_resolves_relative_paths() {
    let base = start_mock_server().await;
    let config = HttpConfig {
        base_url: Some(format!("{base}/")),
        ..HttpConfig::default()
    };
    let client = HttpClient::new(&config).unwrap();

    let response = client.get("a", RequestOptions::new()).await.unwrap();
    assert_eq!(response.json(), Some(&json!({"k": 1})));
}

/// Serves one endless chunked response with no Content-Length
async fn start_endless_chunked_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;

        let head = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nContent-Type: text/plain\r\n\r\n";
        if socket.write_all(head.as_bytes()).await.is_err() {
            return;
        }

        let mut chunk = b"400\r\n".to_vec();
        chunk.extend(std::iter::repeat_n(b'x', 1024));
        chunk.extend_from_slice(b"\r\n");
        while socket.write_all(&chunk).await.is_ok() {}
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn test_chunked_body_stops_at_size_limit() {
    let base = start_endless_chunked_server().await;
    let config = HttpConfig {
        max_response_bytes: ByteSize(4096),
        ..HttpConfig::default()
    };
    let client = HttpClient::new(&config).unwrap();

    // An unbounded read would run into the timeout instead
    let err = client
        .get(
            &format!("{base}/stream"),
            RequestOptions::new().timeout(Duration::from_secs(5)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::BodyTooLarge { .. }));
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn test_response_size_limit() {
    let base = start_mock_server().await;
    let config = HttpConfig {
        max_response_bytes: ByteSize(1024),
        ..HttpConfig::default()
    };
    let metrics = Arc::new(Metrics::new());
    let client = HttpClient::new(&config).unwrap().with_metrics(metrics.clone());

    let err = client
        .get(&format!("{base}/big"), RequestOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::BodyTooLarge { .. }));
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.http_requests, 1);
    assert_eq!(snapshot.http_failures, 1);
}
