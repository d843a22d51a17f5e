use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use fsapi_core::hash::hex_md5;
use fsapi_core::time::parse_timestamp;
use fsapi_core::{ApiErrorCode, Body, ErrorKind, FilePart, ResponseBody, RetryPolicy};
use http::header::{AUTHORIZATION, CONTENT_TYPE, DATE};
use http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use super::{test_client, MockApi};

#[tokio::test]
async fn test_request_carries_signed_headers() -> Result<()> {
    let api = MockApi::fixed(200, "application/json", r#"{"id":1}"#);
    let client = test_client(api.clone());

    client
        .post("/developers/17789/plugins.json", json!({"title": "x"}))
        .await?;

    let seen = &api.seen()[0];
    assert_eq!(seen.method, Method::POST);
    assert_eq!(
        seen.uri,
        "http://127.0.0.1:9900/v1/developers/17789/plugins.json"
    );
    assert_eq!(seen.body, r#"{"title":"x"}"#);
    assert_eq!(seen.headers["content-md5"], hex_md5(&seen.body).as_str());
    assert!(seen.headers[AUTHORIZATION]
        .to_str()?
        .starts_with("FS 17789:pk_test:"));
    parse_timestamp(seen.headers[DATE].to_str()?)?;
    Ok(())
}

#[tokio::test]
async fn test_wire_method_matches_signed_method() -> Result<()> {
    let api = MockApi::fixed(200, "application/json", "{}");
    let client = test_client(api.clone());

    client
        .request(Method::from_bytes(b"delete")?, "/plugins/1.json", Body::Empty)
        .await?;
    client.api("/plugins/1.json", "put", json!({"a": 1}).into()).await?;

    let seen = api.seen();
    assert_eq!(seen[0].method.as_str(), "DELETE");
    assert_eq!(seen[1].method.as_str(), "PUT");
    assert!(seen[1].headers.contains_key("content-md5"));
    Ok(())
}

#[tokio::test]
async fn test_upload_with_files() -> Result<()> {
    let api = MockApi::fixed(200, "application/json", r#"{"id":3}"#);
    let client = test_client(api.clone());

    let zip = FilePart::new("file", "my-plugin.zip", &b"PK\x03\x04"[..])?;
    client
        .api_with_files(
            "/plugins/1/tags.json",
            "POST",
            json!({"add_contributor": false}),
            vec![zip],
        )
        .await?;

    let seen = &api.seen()[0];
    assert_eq!(seen.method, Method::POST);
    assert_eq!(
        seen.uri,
        "http://127.0.0.1:9900/v1/developers/17789/plugins/1/tags.json"
    );
    assert!(seen.headers.get("content-md5").is_none());
    assert!(seen.headers[AUTHORIZATION].to_str()?.starts_with("FS 17789:pk_test:"));

    let content_type = seen.headers[CONTENT_TYPE].to_str()?;
    let boundary = content_type
        .strip_prefix("multipart/form-data; boundary=")
        .expect("multipart content type");
    let body = String::from_utf8_lossy(&seen.body);
    assert!(body.starts_with(&format!("--{boundary}\r\n")));
    assert!(body.contains(concat!(
        "name=\"data\"\r\n",
        "Content-Type: application/json\r\n",
        "\r\n",
        "{\"add_contributor\":false}"
    )));
    assert!(body.contains("filename=\"my-plugin.zip\"\r\nContent-Type: application/zip"));
    assert!(body.ends_with(&format!("--{boundary}--\r\n")));
    Ok(())
}

#[test]
fn test_upload_rejects_unknown_file_type() {
    assert_eq!(
        FilePart::new("file", "readme.md", &b"# hi"[..])
            .unwrap_err()
            .kind(),
        ErrorKind::RequestInvalid
    );
}

#[tokio::test]
async fn test_version_prefix_is_not_doubled() -> Result<()> {
    let api = MockApi::fixed(200, "application/json", "{}");
    let client = test_client(api.clone());

    client.get("/v1/plugins/1.json").await?;
    client.get("/plugins/1.json").await?;

    let seen = api.seen();
    assert_eq!(seen[0].uri, "http://127.0.0.1:9900/v1/plugins/1.json");
    assert_eq!(seen[0].uri, seen[1].uri);
    Ok(())
}

#[tokio::test]
async fn test_api_uses_scope_path() -> Result<()> {
    let api = MockApi::fixed(200, "application/json", r#"{"plugins":[]}"#);
    let client = test_client(api.clone());

    let resp = client.api("plugins.json?count=5", "get", Body::Empty).await?;

    assert_eq!(resp.json(), Some(&json!({"plugins": []})));
    assert_eq!(
        api.seen()[0].uri,
        "http://127.0.0.1:9900/v1/developers/17789/plugins.json?count=5"
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_then_success() -> Result<()> {
    let api = MockApi::new(|attempt, _| match attempt {
        0 => (429, "application/json", "{}".to_string()),
        _ => (200, "application/json", r#"{"id":7}"#.to_string()),
    });
    let client = test_client(api.clone());

    let start = tokio::time::Instant::now();
    let resp = client.get("/plugins/7.json").await?;

    assert_eq!(resp.body, ResponseBody::Json(json!({"id": 7})));
    assert_eq!(start.elapsed(), Duration::from_secs(1));

    let seen = api.seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].headers[DATE], seen[1].headers[DATE]);
    assert_eq!(seen[0].headers[AUTHORIZATION], seen[1].headers[AUTHORIZATION]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_exhausted() {
    let api = MockApi::fixed(429, "application/json", "{}");
    let client = test_client(api.clone());

    let err = client.get("/plugins.json").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RateLimited);
    assert!(err.is_rate_limited());
    assert_eq!(err.attempts(), Some(3));
    assert_eq!(api.seen().len(), 3);
}

#[tokio::test]
async fn test_custom_retry_policy() {
    let api = MockApi::fixed(429, "application/json", "{}");
    let client = test_client(api.clone()).with_transport(|t| {
        t.with_retry(RetryPolicy {
            max_attempts: 1,
            delay: Duration::from_secs(60),
        })
    });

    let err = client.get("/plugins.json").await.unwrap_err();
    assert_eq!(err.attempts(), Some(1));
    assert_eq!(api.seen().len(), 1);
}

#[tokio::test]
async fn test_api_error_is_typed() {
    let api = MockApi::fixed(
        404,
        "application/json",
        r#"{"error":{"type":"NotFound","message":"Not Found","code":"plugin_not_found"}}"#,
    );
    let client = test_client(api.clone());

    let err = client.get("/plugins/99.json").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ApiRejected);
    let api_err = err.api_error().expect("api error must be set");
    assert_eq!(api_err.status, StatusCode::NOT_FOUND);
    assert_eq!(api_err.error_type, "NotFound");
    assert_eq!(api_err.message, "Not Found");
    assert_eq!(api_err.code, ApiErrorCode::Text("plugin_not_found".to_string()));
    assert_eq!(api.seen().len(), 1);
}

#[tokio::test]
async fn test_malformed_json_is_unexpected() {
    let api = MockApi::fixed(200, "application/json", "<html>oops</html>");
    let client = test_client(api);

    let err = client.get("/plugins.json").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unexpected);
    assert!(!err.is_api_error());
}

#[tokio::test]
async fn test_raw_body_passthrough() -> Result<()> {
    let api = MockApi::fixed(200, "application/zip", "PK\u{3}\u{4}zipdata");
    let client = test_client(api);

    let resp = client.get("/plugins/1/tags/latest.zip").await?;
    assert_eq!(resp.raw().map(|b| b.as_ref()), Some(&b"PK\x03\x04zipdata"[..]));
    Ok(())
}

#[tokio::test]
async fn test_find_clock_diff() -> Result<()> {
    let api = MockApi::new(|_, _| {
        let remote = Utc::now() - chrono::Duration::seconds(30);
        (
            200,
            "application/json",
            json!({"api": "pong", "timestamp": remote.to_rfc3339()}).to_string(),
        )
    });
    let client = test_client(api.clone());

    let diff = client.find_clock_diff().await?;
    assert!((28..=32).contains(&diff), "diff was {diff}");
    assert_eq!(client.context().clock_diff(), 0);
    assert_eq!(api.seen()[0].uri, "http://127.0.0.1:9900/v1/ping.json");
    Ok(())
}

#[tokio::test]
async fn test_sync_clock_shifts_date() -> Result<()> {
    let api = MockApi::new(|_, _| {
        let remote = Utc::now() - chrono::Duration::seconds(30);
        (
            200,
            "application/json",
            json!({"api": "pong", "timestamp": remote.format("%Y-%m-%d %H:%M:%S").to_string()})
                .to_string(),
        )
    });
    let client = test_client(api.clone());

    let diff = client.sync_clock().await?;
    assert_eq!(client.context().clock_diff(), diff);

    client.get("/plugins.json").await?;
    let date = parse_timestamp(api.seen()[1].headers[DATE].to_str()?)?;
    let shift = (Utc::now() - date).num_seconds();
    assert!((28..=33).contains(&shift), "shift was {shift}");
    Ok(())
}

#[tokio::test]
async fn test_find_clock_diff_without_timestamp() {
    let client = test_client(MockApi::fixed(200, "application/json", r#"{"api":"pong"}"#));

    let err = client.find_clock_diff().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unexpected);
}

#[tokio::test]
async fn test_ping_pong() -> Result<()> {
    let client = test_client(MockApi::fixed(200, "application/json", r#"{"api":"pong"}"#));
    assert!(client.test().await?);

    let client = test_client(MockApi::fixed(200, "application/json", r#"{"api":"ping"}"#));
    assert!(!client.test().await?);
    Ok(())
}

#[tokio::test]
async fn test_ping_rejected() -> Result<()> {
    let client = test_client(MockApi::fixed(
        401,
        "application/json",
        r#"{"error":{"type":"InvalidSignature","message":"Invalid signature.","code":"invalid_signature"}}"#,
    ));

    assert!(!client.test().await?);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_ping_rate_limited_is_an_error() {
    let client = test_client(MockApi::fixed(429, "application/json", "{}"));

    let err = client.test().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimited);
}

#[test]
fn test_signed_url() {
    let client = test_client(MockApi::fixed(200, "application/json", "{}"));

    let url = client.signed_url("/plugins/1/tags/latest.zip?is_premium=true", &[("beta", "false")]);

    let (base, query) = url.split_once('?').expect("query must exist");
    assert_eq!(base, "http://127.0.0.1:9900/v1/plugins/1/tags/latest.zip");

    let keys: Vec<String> = form_urlencoded::parse(query.as_bytes())
        .map(|(k, _)| k.into_owned())
        .collect();
    assert_eq!(keys, ["is_premium", "beta", "auth_date", "authorization"]);

    let auth = form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "authorization")
        .map(|(_, v)| v.into_owned())
        .expect("authorization must exist");
    assert!(auth.starts_with("FS 17789:pk_test:"));
}

#[test]
fn test_credential_debug_is_redacted() {
    let client = test_client(MockApi::fixed(200, "application/json", "{}"));

    let debug = format!("{:?}", client);
    assert!(!debug.contains("sk_test"));
}
