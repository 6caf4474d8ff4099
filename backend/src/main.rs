//! Registrar entry-point: loads settings, wires adapters, and serves the REST API.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use registrar::inbound::http::health::HealthState;

use server::{AppComponents, AppSettings, ServerConfig, build_components, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|err| std::io::Error::other(format!("failed to load configuration: {err}")))?;
    let bind_addr = settings.bind_addr()?;

    let AppComponents { http_state, probe } = build_components(&settings).await?;
    let health_state = match probe {
        Some(probe) => HealthState::new().with_probe(probe),
        None => HealthState::new(),
    };
    let health_state = web::Data::new(health_state);

    let config = ServerConfig::new(bind_addr);
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(server::request_metrics());

    create_server(health_state, http_state, config)?.await
}
