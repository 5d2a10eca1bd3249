use anyhow::Context;

use edugate_api::app::{build_app, services};
use edugate_infra::AuthConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    edugate_observability::init();

    let config = AuthConfig::from_env()?;
    let authorizer = services::build_authorizer(&config).await?;
    let app = build_app(authorizer, config.session_cookie.as_str());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
