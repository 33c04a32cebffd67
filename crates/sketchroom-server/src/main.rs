use sketchroom_server::{AppState, ServerConfig, router};
use tracing::info;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sketchroom_server=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env().expect("invalid configuration");
    let addr = config.addr;
    let state = AppState::from_config(config)
        .await
        .expect("failed to open shape store");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listen address");
    info!("Sketchroom server listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws?token=<jwt>", addr);

    axum::serve(listener, router(state))
        .await
        .expect("server error");
}
