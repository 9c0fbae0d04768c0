use offliner_axum::{start_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    start_server(ServerConfig::from_env()).await
}
