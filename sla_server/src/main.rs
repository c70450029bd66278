use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::fmt::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer as _;

use sla_server::{get_router, AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<()> {
  let config = AppConfig::load().map_err(|err| {
    eprintln!("failed to load configuration: {err}");
    eprintln!("copy sla_server/sla.yml.example to sla_server/sla.yml, or set SLA_CONFIG");
    err
  })?;

  let level = config
    .observability
    .log_level
    .parse::<LevelFilter>()
    .unwrap_or(LevelFilter::INFO);
  let layer = Layer::new().with_filter(level);
  tracing_subscriber::registry().with(layer).init();

  let state = AppState::try_new(&config).await?;
  let app = get_router(state);

  let addr = format!("0.0.0.0:{}", config.server.port);
  let listener = TcpListener::bind(&addr).await?;
  info!("sla_server listening on {addr}");

  axum::serve(listener, app).await?;
  Ok(())
}
