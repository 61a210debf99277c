use anyhow::Context;
use stoopid_paste::{
    api,
    config::{self, Config},
};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env().context("Invalid configuration")?;
    let container = config::init_container(&config).await?;

    let app = api::router(container);

    let listener = TcpListener::bind(&config.addr).await?;
    info!(addr = %listener.local_addr()?, "Started listening on TCP");
    axum::serve(listener, app).await?;
    Ok(())
}
