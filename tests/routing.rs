//! Router semantics: registration order, middleware continuation, path
//! parameters, and cross-router dispatch.

use mock_proxy::Router;
use serde_json::json;

mod common;

#[tokio::test]
async fn entries_match_in_registration_order() {
    let engine = common::spawn_engine(common::test_config()).await;

    let router = Router::new("http://ordered.test").unwrap();
    router
        .get("/item", |_ctx, res, _next| async move {
            res.send("first entry");
            Ok(())
        })
        .get("/item", |_ctx, res, _next| async move {
            res.send("second entry");
            Ok(())
        });

    let client = common::proxied_client(engine.proxy_addr);
    let response = client.get("http://ordered.test/item").send().await.unwrap();

    assert_eq!(response.text().await.unwrap(), "first entry");
}

#[tokio::test]
async fn middleware_chains_into_route_via_next() {
    let engine = common::spawn_engine(common::test_config()).await;

    let router = Router::new("http://chain.test").unwrap();
    router
        .use_(|_ctx, res, next| async move {
            res.header("x-trace", "middleware-saw-this");
            next.proceed();
            Ok(())
        })
        .get("/users", |_ctx, res, _next| async move {
            res.json(&json!(["alice", "bob"]))?;
            Ok(())
        });

    let client = common::proxied_client(engine.proxy_addr);
    let response = client.get("http://chain.test/users").send().await.unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["x-trace"], "middleware-saw-this");
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!(["alice", "bob"]));
}

#[tokio::test]
async fn stopping_without_next_ends_the_chain() {
    let engine = common::spawn_engine(common::test_config()).await;

    let router = Router::new("http://stopper.test").unwrap();
    router
        .use_(|_ctx, res, _next| async move {
            // No next.proceed(): later entries never run.
            res.status(403).send("blocked");
            Ok(())
        })
        .get("/secret", |_ctx, res, _next| async move {
            res.send("should never be reached");
            Ok(())
        });

    let client = common::proxied_client(engine.proxy_addr);
    let response = client
        .get("http://stopper.test/secret")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 403);
    assert_eq!(response.text().await.unwrap(), "blocked");
}

#[tokio::test]
async fn named_params_reach_the_handler() {
    let engine = common::spawn_engine(common::test_config()).await;

    let router = Router::new("http://params.test").unwrap();
    router.get("/users/:id/posts/:post", |ctx, res, _next| async move {
        res.json(&json!({
            "user": ctx.param("id"),
            "post": ctx.param("post"),
        }))?;
        Ok(())
    });

    let client = common::proxied_client(engine.proxy_addr);
    let response = client
        .get("http://params.test/users/42/posts/7")
        .send()
        .await
        .unwrap();

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({"user": "42", "post": "7"}));
}

#[tokio::test]
async fn trailing_wildcard_catches_subtrees() {
    let engine = common::spawn_engine(common::test_config()).await;

    let router = Router::new("http://wild.test").unwrap();
    router.get("/static/*", |ctx, res, _next| async move {
        res.send(format!("asset: {}", ctx.param("*").unwrap_or_default()));
        Ok(())
    });

    let client = common::proxied_client(engine.proxy_addr);
    let response = client
        .get("http://wild.test/static/css/site.css")
        .send()
        .await
        .unwrap();

    assert_eq!(response.text().await.unwrap(), "asset: css/site.css");
}

#[tokio::test]
async fn method_scoping_is_exact() {
    let origin = common::start_origin("origin handled it").await;
    let engine = common::spawn_engine(common::test_config()).await;

    let router = Router::new(format!("http://{}", origin).as_str()).unwrap();
    router.post("/submit", |_ctx, res, _next| async move {
        res.send_status(201);
        Ok(())
    });

    let client = common::proxied_client(engine.proxy_addr);

    let response = client
        .post(format!("http://{}/submit", origin))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    // A GET on the same path is unmatched and goes to the real origin.
    let response = client
        .get(format!("http://{}/submit", origin))
        .send()
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), "origin handled it");
}

#[tokio::test]
async fn base_url_path_prefix_scopes_the_router() {
    let engine = common::spawn_engine(common::test_config()).await;

    let router = Router::new("http://scoped.test/api/v2").unwrap();
    router.get("/things", |_ctx, res, _next| async move {
        res.json(&json!({"scoped": true}))?;
        Ok(())
    });

    let client = common::proxied_client(engine.proxy_addr);
    let response = client
        .get("http://scoped.test/api/v2/things")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({"scoped": true}));
}

#[tokio::test]
async fn later_router_answers_when_earlier_does_not_match() {
    let engine = common::spawn_engine(common::test_config()).await;

    let first = Router::new("http://tandem.test").unwrap();
    first.get("/only-first", |_ctx, res, _next| async move {
        res.send("from first");
        Ok(())
    });

    let second = Router::new("http://tandem.test").unwrap();
    second.get("/only-second", |_ctx, res, _next| async move {
        res.send("from second");
        Ok(())
    });

    let client = common::proxied_client(engine.proxy_addr);

    let response = client
        .get("http://tandem.test/only-second")
        .send()
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), "from second");

    let response = client
        .get("http://tandem.test/only-first")
        .send()
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), "from first");
}
