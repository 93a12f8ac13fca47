use mock_proxy::{EngineConfig, HttpServer, Router};
use serde_json::json;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let router = Router::new("http://api.example.com")?;
    router
        .use_(|ctx, _res, next| async move {
            println!("saw {} {}", ctx.request.method(), ctx.request.url());
            next.proceed();
            Ok(())
        })
        .get("/users/:id", |ctx, res, _next| async move {
            res.json(&json!({ "id": ctx.param("id"), "name": "Mocked User" }))?;
            Ok(())
        });

    let config = EngineConfig::default();
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let addr = listener.local_addr()?;

    println!("Interception proxy listening on http://{}", addr);
    println!("Try: curl -x http://{} http://api.example.com/users/1", addr);
    println!("Anything else passes through to the real network.");

    HttpServer::new(config).run(listener).await?;
    Ok(())
}
