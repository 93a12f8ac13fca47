//! End-to-end interception tests: mock resolution, passthrough fallback,
//! and the safety timer.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use mock_proxy::Router;
use serde_json::json;

mod common;

#[tokio::test]
async fn middleware_resolves_any_path_with_json() {
    let engine = common::spawn_engine(common::test_config()).await;

    let router = Router::new("http://scenario-a.test").unwrap();
    router.use_(|_ctx, res, _next| async move {
        res.status(201).json(&json!({"id": 1}))?;
        Ok(())
    });

    let client = common::proxied_client(engine.proxy_addr);
    let response = client
        .get("http://scenario-a.test/anything")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert_eq!(response.headers()["x-powered-by"], "mock-proxy");

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({"id": 1}));
}

#[tokio::test]
async fn unmatched_request_falls_back_to_real_network() {
    let origin = common::start_origin("the real origin").await;
    let engine = common::spawn_engine(common::test_config()).await;

    let url = format!("http://{}/missing", origin);
    let direct = reqwest::get(&url).await.unwrap();
    let direct_status = direct.status();
    let direct_body = direct.bytes().await.unwrap();

    let client = common::proxied_client(engine.proxy_addr);
    let start = Instant::now();
    let response = client.get(&url).send().await.unwrap();
    let elapsed = start.elapsed();

    // No earlier than the fallback delay, and byte-identical to direct.
    assert!(
        elapsed >= Duration::from_millis(180),
        "fallback fired too early: {:?}",
        elapsed
    );
    assert_eq!(response.status(), direct_status);
    assert!(!response.headers().contains_key("x-powered-by"));
    assert_eq!(response.bytes().await.unwrap(), direct_body);
}

#[tokio::test]
async fn silent_handler_is_rescued_by_safety_timer() {
    let origin = common::start_origin("rescued by passthrough").await;
    let engine = common::spawn_engine(common::test_config()).await;

    // Matches, never finalizes, never calls next.
    let router = Router::new(format!("http://{}", origin).as_str()).unwrap();
    router.get("/slow", |_ctx, _res, _next| async move { Ok(()) });

    let client = common::proxied_client(engine.proxy_addr);
    let start = Instant::now();
    let response = client
        .get(format!("http://{}/slow", origin))
        .send()
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert!(
        elapsed >= Duration::from_millis(550),
        "safety timer fired too early: {:?}",
        elapsed
    );
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "rescued by passthrough");
}

#[tokio::test]
async fn send_status_uses_canonical_reason() {
    let engine = common::spawn_engine(common::test_config()).await;

    let router = Router::new("http://scenario-d.test").unwrap();
    router.get("/gone", |_ctx, res, _next| async move {
        res.send_status(404);
        Ok(())
    });

    let client = common::proxied_client(engine.proxy_addr);
    let response = client
        .get("http://scenario-d.test/gone")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    assert_eq!(response.headers()["content-type"], "text/plain");
    assert_eq!(response.text().await.unwrap(), "Not Found");
}

#[tokio::test]
async fn repeated_finalization_keeps_first_response() {
    let engine = common::spawn_engine(common::test_config()).await;

    let router = Router::new("http://idempotent.test").unwrap();
    router.get("/once", |_ctx, res, _next| async move {
        res.status(200).send("first");
        res.status(500).send("second");
        res.json(&json!({"ignored": true}))?;
        Ok(())
    });

    let client = common::proxied_client(engine.proxy_addr);
    let response = client
        .get("http://idempotent.test/once")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "first");
}

#[tokio::test]
async fn head_request_gets_empty_body() {
    let engine = common::spawn_engine(common::test_config()).await;

    let router = Router::new("http://head.test").unwrap();
    router.head("/resource", |_ctx, res, _next| async move {
        res.send("a body that must be dropped");
        Ok(())
    });

    let client = common::proxied_client(engine.proxy_addr);
    let response = client
        .head("http://head.test/resource")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.bytes().await.unwrap().len(), 0);
}

#[tokio::test]
async fn bodyless_status_strips_handler_body() {
    let engine = common::spawn_engine(common::test_config()).await;

    let router = Router::new("http://nobody.test").unwrap();
    router.get("/gone", |_ctx, res, _next| async move {
        res.status(204).send("must vanish");
        Ok(())
    });

    let client = common::proxied_client(engine.proxy_addr);
    let response = client
        .get("http://nobody.test/gone")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 204);
    assert_eq!(response.bytes().await.unwrap().len(), 0);
}

#[tokio::test]
async fn explicit_forward_bypasses_the_mock_layer() {
    let origin = common::start_origin("forwarded").await;
    let engine = common::spawn_engine(common::test_config()).await;

    let router = Router::new(format!("http://{}", origin).as_str()).unwrap();
    router.get("/through", |_ctx, res, _next| async move {
        res.forward().await;
        Ok(())
    });

    let client = common::proxied_client(engine.proxy_addr);
    let start = Instant::now();
    let response = client
        .get(format!("http://{}/through", origin))
        .send()
        .await
        .unwrap();

    // An explicit forward resolves immediately, well before the fallback.
    assert!(start.elapsed() < Duration::from_millis(180));
    assert_eq!(response.text().await.unwrap(), "forwarded");
}

#[tokio::test]
async fn passthrough_preserves_method_headers_and_body() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let origin = common::start_recording_origin(seen.clone()).await;
    let engine = common::spawn_engine(common::test_config()).await;

    let client = common::proxied_client(engine.proxy_addr);
    let response = client
        .post(format!("http://{}/echo", origin))
        .header("x-custom", "survives")
        .body("payload bytes")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].request_line.starts_with("POST /echo"));
    assert!(seen[0]
        .headers
        .iter()
        .any(|h| h.to_lowercase().starts_with("x-custom: survives")));
    assert_eq!(seen[0].body, b"payload bytes");

    // Hop-by-hop headers never reach the origin.
    assert!(!seen[0]
        .headers
        .iter()
        .any(|h| h.to_lowercase().starts_with("proxy-connection")));
}

#[tokio::test]
async fn handler_error_still_completes_via_passthrough() {
    let origin = common::start_origin("recovered").await;
    let engine = common::spawn_engine(common::test_config()).await;

    let router = Router::new(format!("http://{}", origin).as_str()).unwrap();
    router.get("/broken", |_ctx, _res, _next| async move {
        Err::<(), _>("handler exploded".into())
    });

    let client = common::proxied_client(engine.proxy_addr);
    let response = client
        .get(format!("http://{}/broken", origin))
        .send()
        .await
        .unwrap();

    // The error is contained; the safety timer finishes the request.
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "recovered");
}
