//! End-to-end tests for token resolution and reverse-proxy forwarding.

use serde_json::{json, Value};
use tempfile::tempdir;

mod common;

fn write_map(path: &std::path::Path, map: &Value) {
    std::fs::write(path, serde_json::to_string(map).unwrap()).unwrap();
}

#[tokio::test]
async fn test_unknown_token_404() {
    let dir = tempdir().unwrap();
    let map_path = dir.path().join("proxy_map.json");
    write_map(&map_path, &json!({"app1": "http://127.0.0.1:4000"}));
    let config = common::test_config(&map_path, &dir.path().join("audit.log"));
    let addr = common::spawn_gateway(config).await;

    let res = common::client()
        .get(format!("http://{addr}/waf/unknown/x"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Unknown proxy token");
}

#[tokio::test]
async fn test_missing_map_file_404() {
    let dir = tempdir().unwrap();
    let config = common::test_config(
        &dir.path().join("never_written.json"),
        &dir.path().join("audit.log"),
    );
    let addr = common::spawn_gateway(config).await;

    let res = common::client()
        .get(format!("http://{addr}/waf/any/x"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_offline_origin_502() {
    let dir = tempdir().unwrap();
    let map_path = dir.path().join("proxy_map.json");
    // Nothing listens on port 9; connection is refused.
    write_map(&map_path, &json!({"dead": "http://127.0.0.1:9"}));
    let config = common::test_config(&map_path, &dir.path().join("audit.log"));
    let addr = common::spawn_gateway(config).await;

    let res = common::client()
        .get(format!("http://{addr}/waf/dead/x"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Upstream unreachable");
}

#[tokio::test]
async fn test_hanging_origin_504() {
    let origin = common::start_hanging_origin().await;

    let dir = tempdir().unwrap();
    let map_path = dir.path().join("proxy_map.json");
    write_map(&map_path, &json!({"slow": format!("http://{origin}")}));
    let mut config = common::test_config(&map_path, &dir.path().join("audit.log"));
    config.proxy.timeout_secs = 1;
    let addr = common::spawn_gateway(config).await;

    let res = common::client()
        .get(format!("http://{addr}/waf/slow/x"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 504);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Upstream timeout");
}

#[tokio::test]
async fn test_healthy_origin_relayed_and_hop_by_hop_stripped() {
    let origin = common::start_static_origin("upstream-ok").await;

    let dir = tempdir().unwrap();
    let map_path = dir.path().join("proxy_map.json");
    write_map(&map_path, &json!({"app": format!("http://{origin}")}));
    let config = common::test_config(&map_path, &dir.path().join("audit.log"));
    let addr = common::spawn_gateway(config).await;

    let res = common::client()
        .get(format!("http://{addr}/waf/app/anything"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    // End-to-end headers are relayed...
    assert_eq!(res.headers().get("x-upstream-marker").unwrap(), "yes");
    // ...hop-by-hop headers from the origin are not.
    assert!(res.headers().get("connection").is_none());
    assert!(res.headers().get("keep-alive").is_none());
    assert!(res.headers().get("transfer-encoding").is_none());
    assert_eq!(res.text().await.unwrap(), "upstream-ok");
}

#[tokio::test]
async fn test_forwarded_headers_reach_origin() {
    let origin = common::start_capture_origin().await;

    let dir = tempdir().unwrap();
    let map_path = dir.path().join("proxy_map.json");
    write_map(&map_path, &json!({"app": format!("http://{origin}")}));
    let config = common::test_config(&map_path, &dir.path().join("audit.log"));
    let addr = common::spawn_gateway(config).await;

    let res = common::client()
        .get(format!("http://{addr}/waf/app/api/users?page=2&sort=name"))
        .header("x-custom-header", "carried")
        .header("cookie", "session=abc")
        .header("x-forwarded-for", "1.2.3.4")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let head = res.text().await.unwrap().to_lowercase();

    // Path and query are preserved verbatim.
    assert!(head.contains("get /api/users?page=2&sort=name"), "head: {head}");
    // Forwarding triplet present; inbound X-Forwarded-For replaced.
    assert!(head.contains("x-forwarded-for: 127.0.0.1"));
    assert!(head.contains("x-forwarded-proto: http"));
    assert!(head.contains(&format!("x-forwarded-host: 127.0.0.1:{}", addr.port())));
    assert!(!head.contains("1.2.3.4"));
    // End-to-end request headers carried through.
    assert!(head.contains("x-custom-header: carried"));
    assert!(head.contains("cookie: session=abc"));
    // Host names the origin, not the gateway.
    assert!(head.contains(&format!("host: 127.0.0.1:{}", origin.port())));
}

#[tokio::test]
async fn test_post_body_forwarded() {
    let origin = common::start_capture_origin().await;

    let dir = tempdir().unwrap();
    let map_path = dir.path().join("proxy_map.json");
    write_map(&map_path, &json!({"app": format!("http://{origin}")}));
    let config = common::test_config(&map_path, &dir.path().join("audit.log"));
    let addr = common::spawn_gateway(config).await;

    let res = common::client()
        .post(format!("http://{addr}/waf/app/submit"))
        .json(&json!({"name": "Alice"}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let head = res.text().await.unwrap().to_lowercase();
    assert!(head.contains("post /submit"));
    assert!(head.contains("content-type: application/json"));
}

#[tokio::test]
async fn test_detection_applies_before_forwarding() {
    // The origin would answer, but a signature match must stop the request
    // at the gateway.
    let origin = common::start_static_origin("should-never-arrive").await;

    let dir = tempdir().unwrap();
    let map_path = dir.path().join("proxy_map.json");
    write_map(&map_path, &json!({"app": format!("http://{origin}")}));
    let config = common::test_config(&map_path, &dir.path().join("audit.log"));
    let addr = common::spawn_gateway(config).await;

    let res = common::client()
        .get(format!("http://{addr}/waf/app/search"))
        .query(&[("q", "<script>alert(1)</script>")])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 403);
}

#[tokio::test]
async fn test_allowlist_skipped_for_proxy_paths() {
    let origin = common::start_capture_origin().await;

    let dir = tempdir().unwrap();
    let map_path = dir.path().join("proxy_map.json");
    write_map(&map_path, &json!({"app": format!("http://{origin}")}));
    let config = common::test_config(&map_path, &dir.path().join("audit.log"));
    let addr = common::spawn_gateway(config).await;

    // A local route would reject this content type; the proxied origin owns
    // its own contract.
    let res = common::client()
        .post(format!("http://{addr}/waf/app/echo"))
        .header("content-type", "text/plain")
        .body("plain text payload")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn test_map_update_visible_without_restart() {
    let origin = common::start_static_origin("fresh-origin").await;

    let dir = tempdir().unwrap();
    let map_path = dir.path().join("proxy_map.json");
    write_map(&map_path, &json!({}));
    let config = common::test_config(&map_path, &dir.path().join("audit.log"));
    let addr = common::spawn_gateway(config).await;
    let client = common::client();

    let res = client
        .get(format!("http://{addr}/waf/late/x"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    // An external process rewrites the map; no restart, next request sees it.
    write_map(&map_path, &json!({"late": format!("http://{origin}")}));

    let res = client
        .get(format!("http://{addr}/waf/late/x"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "fresh-origin");
}
