use std::sync::Arc;

use anyhow::Context;

use tabs_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tabs_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let services = tabs_api::app::services::build_services(&config).await?;
    let app = tabs_api::app::build_app(config.jwt_secret.clone(), Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
