use std::env;

use anyhow::{Context, Result};
use suraksha_api::build_app;
use suraksha_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("suraksha_api");

    let bind = env::var("SURAKSHA_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let app = build_app().await?;

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    tracing::info!(%bind, "suraksha concierge API listening");

    axum::serve(listener, app)
        .await
        .context("server terminated unexpectedly")?;
    Ok(())
}
