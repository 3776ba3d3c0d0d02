//! Prometheus request metrics that can be switched off at start-up.
//!
//! Registration of the collector may fail (for example on a duplicate
//! registry name); the server then keeps serving without `/metrics`.

use actix_service::{
    Service, ServiceExt as _, Transform,
    boxed::{self, BoxService},
};
use actix_web::body::BoxBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Compat;
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use futures_util::future::LocalBoxFuture;
use std::sync::Arc;
use tracing::warn;

/// Namespace prefixed to every exported series.
const METRICS_NAMESPACE: &str = "storefront";

/// Build the collector, logging and discarding a registration failure.
pub(crate) fn initialize_metrics<F, E>(build: F) -> Option<PrometheusMetrics>
where
    F: FnOnce() -> Result<PrometheusMetrics, E>,
    E: std::fmt::Display,
{
    match build() {
        Ok(metrics) => Some(metrics),
        Err(error) => {
            warn!(%error, "metrics disabled: collector failed to register");
            None
        }
    }
}

/// Collector exposing `/metrics` under the storefront namespace.
pub(crate) fn storefront_metrics() -> Option<PrometheusMetrics> {
    initialize_metrics(|| {
        PrometheusMetricsBuilder::new(METRICS_NAMESPACE)
            .endpoint("/metrics")
            .build()
    })
}

#[derive(Clone)]
pub(crate) enum MetricsLayer {
    Enabled(Arc<PrometheusMetrics>),
    Disabled,
}

impl MetricsLayer {
    #[must_use]
    pub(crate) fn from_option(metrics: Option<PrometheusMetrics>) -> Self {
        metrics.map_or(Self::Disabled, |metrics| Self::Enabled(Arc::new(metrics)))
    }
}

impl<S, B> Transform<S, ServiceRequest> for MetricsLayer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = BoxService<ServiceRequest, ServiceResponse<BoxBody>, actix_web::Error>;
    type Future = LocalBoxFuture<'static, Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        match self.clone() {
            MetricsLayer::Enabled(metrics) => {
                let fut = Compat::new((*metrics).clone()).new_transform(service);
                Box::pin(async move {
                    let svc = fut.await?;
                    Ok(boxed::service(svc))
                })
            }
            MetricsLayer::Disabled => Box::pin(async move {
                let svc = service.map(|res: ServiceResponse<B>| res.map_into_boxed_body());
                Ok(boxed::service(svc))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;

    #[rstest]
    fn registration_failure_disables_metrics() {
        let metrics = initialize_metrics(|| -> Result<PrometheusMetrics, &str> { Err("boom") });

        assert!(metrics.is_none());
    }

    #[rstest]
    #[case::enabled(true, StatusCode::OK)]
    #[case::disabled(false, StatusCode::NOT_FOUND)]
    #[actix_web::test]
    async fn metrics_endpoint_follows_the_layer(
        #[case] enabled: bool,
        #[case] expected: StatusCode,
    ) {
        let metrics = enabled
            .then(|| {
                PrometheusMetricsBuilder::new("layer_test")
                    .registry(prometheus::Registry::new())
                    .endpoint("/metrics")
                    .build()
                    .expect("collector builds")
            });
        let app = test::init_service(
            App::new()
                .wrap(MetricsLayer::from_option(metrics))
                .route("/ping", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let ping = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
        let scrape =
            test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;

        assert_eq!(ping.status(), StatusCode::OK);
        assert_eq!(scrape.status(), expected);
    }
}
