use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    match std::env::var("MOCK_NTLM_USER") {
        Ok(user) => {
            tracing::info!(%addr, %user, "listening");
            mock_server::run_with_user(listener, &user).await
        }
        Err(_) => {
            tracing::info!(%addr, user = mock_server::DEFAULT_USER, "listening");
            mock_server::run(listener).await
        }
    }
}
