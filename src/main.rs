use anyhow::{Context, Result};
use arogyam::{api, chain::RagChain, config, logging};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    config::init_config();
    logging::init_tracing("arogyam");

    let chain = RagChain::new()
        .await
        .context("failed to initialize the retrieval chain")?;
    let app = api::create_router(Arc::new(chain));

    let port = config::get_config().server_port;
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app)
        .await
        .context("HTTP server terminated unexpectedly")?;

    Ok(())
}
