//! Prometheus request metrics, compiled in with the `metrics` feature.

use std::fmt::Display;
use std::sync::Arc;

use actix_service::{
    Service, ServiceExt as _, Transform,
    boxed::{self, BoxService},
};
use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Compat;
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

const METRICS_NAMESPACE: &str = "registrar";
const METRICS_ENDPOINT: &str = "/metrics";

/// Run `build`, logging and discarding any failure so the server can start
/// without metrics.
pub(crate) fn initialize_metrics<F, E>(build: F) -> Option<PrometheusMetrics>
where
    F: FnOnce() -> Result<PrometheusMetrics, E>,
    E: Display,
{
    match build() {
        Ok(metrics) => Some(metrics),
        Err(error) => {
            warn!(%error, "Prometheus initialisation failed; serving without metrics");
            None
        }
    }
}

/// Request metrics exposed on `/metrics` under the `registrar` namespace.
pub(crate) fn request_metrics() -> Option<PrometheusMetrics> {
    initialize_metrics(|| {
        PrometheusMetricsBuilder::new(METRICS_NAMESPACE)
            .endpoint(METRICS_ENDPOINT)
            .build()
    })
}

/// Middleware that records request metrics when a registry is present and
/// passes requests straight through otherwise.
///
/// Both branches box the inner service so the app type is the same either
/// way.
#[derive(Clone)]
pub(crate) struct RequestMetrics(Option<Arc<PrometheusMetrics>>);

impl RequestMetrics {
    #[must_use]
    pub(crate) fn new(metrics: Option<PrometheusMetrics>) -> Self {
        Self(metrics.map(Arc::new))
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestMetrics
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = BoxService<ServiceRequest, ServiceResponse<BoxBody>, actix_web::Error>;
    type Future = LocalBoxFuture<'static, Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let Some(metrics) = self.0.clone() else {
            let passthrough = service.map(|res: ServiceResponse<B>| res.map_into_boxed_body());
            return Box::pin(async move { Ok(boxed::service(passthrough)) });
        };
        let instrumented = Compat::new((*metrics).clone()).new_transform(service);
        Box::pin(async move { Ok(boxed::service(instrumented.await?)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn failed_initialisation_yields_no_metrics() {
        let metrics = initialize_metrics(|| -> Result<PrometheusMetrics, &str> { Err("boom") });
        assert!(metrics.is_none());
    }

    #[rstest]
    fn successful_initialisation_yields_metrics() {
        let metrics = initialize_metrics(|| {
            PrometheusMetricsBuilder::new("registrar_test")
                .endpoint(METRICS_ENDPOINT)
                .build()
        });
        assert!(metrics.is_some());
    }
}
