use mock_proxy::control::{port, ControlFrame};
use mock_proxy::{EngineConfig, HttpServer};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::default();
    let listener = TcpListener::bind("127.0.0.1:0").await?;

    let server = HttpServer::new(config);
    let control = server.control();
    let clients = server.clients();

    clients.connect("http://localhost:3000");
    clients.connect("http://localhost:3001");

    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    // Liveness check.
    let (ours, theirs) = port::pair(4);
    control.post(ControlFrame::Ping, Some(theirs)).await?;
    println!("ping -> {:?}", ours.recv().await);

    // Take control of the registered client sessions.
    let (ours, theirs) = port::pair(4);
    control.post(ControlFrame::RequestClaim, Some(theirs)).await?;
    println!("request_claim -> {:?}", ours.recv().await);
    println!("controlled sessions: {}", clients.controlled_count());

    Ok(())
}
