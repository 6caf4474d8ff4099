//! Liveness and readiness probes.
//!
//! Readiness flips on once start-up (migrations, pool, services) has
//! finished and, when a [`ReadinessProbe`] is installed, also requires the
//! backing store to answer. Liveness stays up until shutdown begins.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use async_trait::async_trait;
use tracing::warn;

/// Dependency check consulted by the readiness probe.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &'static str;

    /// Return `Err` with a reason when the dependency is unreachable.
    async fn check(&self) -> Result<(), String>;
}

/// Shared health state for readiness and liveness checks.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
    probe: Option<Arc<dyn ReadinessProbe>>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
            probe: None,
        }
    }
}

impl HealthState {
    /// Not ready, but live.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also require `probe` to pass before reporting ready.
    pub fn with_probe(mut self, probe: Arc<dyn ReadinessProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Fail liveness so orchestrators stop routing during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    async fn dependencies_ok(&self) -> bool {
        let Some(probe) = &self.probe else {
            return true;
        };
        match probe.check().await {
            Ok(()) => true,
            Err(reason) => {
                warn!(dependency = probe.name(), %reason, "readiness probe failed");
                false
            }
        }
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Readiness probe: 200 once start-up completed and dependencies answer.
#[utoipa::path(
    get,
    path = "/api/v1/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is not ready")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    let ok = state.is_ready() && state.dependencies_ok().await;
    HealthState::probe_response(ok)
}

/// Liveness probe: 200 until the server starts draining.
#[utoipa::path(
    get,
    path = "/api/v1/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_alive())
}
