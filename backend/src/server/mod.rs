//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod state_builders;

pub use config::AppSettings;
pub use state_builders::{AppComponents, build_components};

#[cfg(feature = "metrics")]
pub(crate) use metrics::request_metrics;
#[cfg(feature = "metrics")]
use metrics::RequestMetrics;

use std::net::SocketAddr;

use actix_web::HttpServer;
use actix_web::dev::Server;
use actix_web::web;
#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;
use tracing::info;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use registrar::ApiDoc;
use registrar::inbound::http::build_app;
use registrar::inbound::http::health::HealthState;
use registrar::inbound::http::state::HttpState;

/// Listener settings for [`create_server`].
pub struct ServerConfig {
    bind_addr: SocketAddr,
    #[cfg(feature = "metrics")]
    prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Record request metrics and serve them on `/metrics`.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}

/// Bind the HTTP server and mark the service ready.
///
/// Swagger UI is mounted at `/docs` in debug builds.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: HttpState,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let http_state = web::Data::new(http_state);
    let server_health_state = health_state.clone();
    let ServerConfig {
        bind_addr,
        #[cfg(feature = "metrics")]
        prometheus,
    } = config;

    #[cfg(feature = "metrics")]
    let metrics_layer = RequestMetrics::new(prometheus);

    let server = HttpServer::new(move || {
        let app = build_app(http_state.clone(), server_health_state.clone());

        #[cfg(debug_assertions)]
        let app =
            app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

        #[cfg(feature = "metrics")]
        let app = app.wrap(metrics_layer.clone());

        app
    })
    .bind(bind_addr)?;

    for addr in server.addrs() {
        info!(%addr, "listening");
    }
    let server = server.run();
    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    //! Bootstrap checks: the server binds and signals readiness.

    use super::*;
    use std::sync::Arc;

    use rstest::{fixture, rstest};

    use registrar::domain::{AccountPolicy, CapacityMode};
    use registrar::inbound::http::state::{Collaborators, Repositories};
    use registrar::outbound::mail::LoggingMailer;
    use registrar::outbound::memory::MemoryStore;
    use registrar::outbound::security::{Argon2PasswordHasher, JwtTokenService};
    use registrar::test_support::TEST_TOKEN_SECRET;
    use zeroize::Zeroizing;

    #[fixture]
    fn health_state() -> web::Data<HealthState> {
        web::Data::new(HealthState::new())
    }

    #[fixture]
    fn http_state() -> HttpState {
        let clock: Arc<dyn mockable::Clock> = Arc::new(mockable::DefaultClock);
        let secret = Zeroizing::new(TEST_TOKEN_SECRET.to_vec());
        let tokens = JwtTokenService::new(&secret, chrono::Duration::hours(1), clock.clone())
            .expect("token service");
        let store = Arc::new(MemoryStore::new());
        HttpState::assemble(
            Repositories {
                identities: store.clone(),
                students: store.clone(),
                faculty: store.clone(),
                courses: store,
            },
            Collaborators {
                hasher: Arc::new(Argon2PasswordHasher::new()),
                tokens: Arc::new(tokens),
                mailer: Arc::new(LoggingMailer),
                clock,
            },
            AccountPolicy::default(),
            CapacityMode::BestEffort,
        )
    }

    #[fixture]
    fn loopback() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    #[rstest]
    #[actix_rt::test]
    async fn create_server_marks_ready(
        health_state: web::Data<HealthState>,
        http_state: HttpState,
        loopback: SocketAddr,
    ) {
        assert!(!health_state.is_ready(), "state should start unready");
        let _server = create_server(health_state.clone(), http_state, ServerConfig::new(loopback))
            .expect("server should bind");
        assert!(health_state.is_ready());
    }

    #[cfg(feature = "metrics")]
    #[rstest]
    #[actix_rt::test]
    async fn create_server_marks_ready_with_metrics(
        health_state: web::Data<HealthState>,
        http_state: HttpState,
        loopback: SocketAddr,
    ) {
        let metrics = actix_web_prom::PrometheusMetricsBuilder::new("registrar_server_test")
            .endpoint("/metrics")
            .build()
            .expect("metrics should build for tests");
        let config = ServerConfig::new(loopback).with_metrics(Some(metrics));
        let _server =
            create_server(health_state.clone(), http_state, config).expect("server should bind");
        assert!(health_state.is_ready());
    }
}
