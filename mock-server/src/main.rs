use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    // Comma separated collections that answer 403.
    let locked = std::env::var("LOCKED_COLLECTIONS").unwrap_or_default();
    let locked: Vec<&str> = locked.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, ?locked, "listening");
    mock_server::run_with_locked(listener, &locked).await
}
