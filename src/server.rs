use crate::app::{ForwardUseCase, PublishUseCase};
use crate::config::{GatewayConfig, PublisherConfig};
use crate::constants::{GATEWAY_SERVICE, PUBLISHER_SERVICE};
use crate::error::{RelayError, Result};
use crate::infra::auth::StaticKeyValidator;
use crate::infra::http_client::{ForwardClient, ProbeClient};
use crate::infra::interval_fetcher::IntervalFetcher;
use crate::metrics::GatewayMetrics;
use crate::publisher::AsyncPublisher;
use crate::rate_limiter::{Limits, RateLimiter};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::future::Future;
use std::net::TcpListener;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub struct GatewayState {
    pub use_case: ForwardUseCase,
    pub limiter: RateLimiter,
}

pub struct PublisherState {
    pub use_case: PublishUseCase,
    pub publisher: Arc<AsyncPublisher>,
}

impl GatewayState {
    /// Wire the first hop's adapters from configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let interval = IntervalFetcher::new(config.cache_uri.clone(), config.timeout())?;
        let forward = ForwardClient::new(
            config.publisher_uri.clone(),
            config.api_key.clone(),
            config.timeout(),
        )?;
        Ok(Self {
            use_case: ForwardUseCase::new(Box::new(interval), Box::new(forward)),
            limiter: RateLimiter::new(Limits {
                requests_per_sec: config.rate_limit.requests_per_sec,
                burst: config.rate_limit.burst,
            }),
        })
    }
}

impl PublisherState {
    /// Wire the second hop around an already running publisher.
    pub fn new(config: &PublisherConfig, publisher: Arc<AsyncPublisher>) -> Result<Self> {
        let probe = ProbeClient::new(config.probe_uri.clone(), config.timeout())?;
        let use_case = PublishUseCase::new(
            Box::new(StaticKeyValidator::new(config.api_key.clone())),
            Box::new(probe),
            publisher.clone(),
            publisher.topic(),
        );
        Ok(Self {
            use_case,
            publisher,
        })
    }
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Decode(_) => StatusCode::BAD_REQUEST,
            RelayError::Auth => StatusCode::UNAUTHORIZED,
            RelayError::Forward(_) | RelayError::SideCall(_) => StatusCode::BAD_GATEWAY,
            RelayError::PublishSubmit(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        }
        (status, self.to_string()).into_response()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Routes of the first hop.
pub fn gateway_router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/api", get(gateway_ping).post(gateway_forward))
        .route("/health", get(gateway_health))
        .route("/metrics", get(metrics_text))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Routes of the second hop.
pub fn publisher_router(state: Arc<PublisherState>) -> Router {
    Router::new()
        .route("/", get(publisher_publish).post(publisher_publish))
        .route("/health", get(publisher_health))
        .route("/metrics", get(metrics_text))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

async fn gateway_forward(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<String, RelayError> {
    state
        .use_case
        .handle(header_str(&headers, header::CONTENT_TYPE), &body)
        .await
}

async fn gateway_ping(State(state): State<Arc<GatewayState>>) -> Response {
    if state.limiter.try_acquire() {
        "Testing Middleware".into_response()
    } else {
        GatewayMetrics::record_rate_limited();
        (StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded").into_response()
    }
}

async fn gateway_health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": GATEWAY_SERVICE,
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn publisher_publish(
    State(state): State<Arc<PublisherState>>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<StatusCode, RelayError> {
    state
        .use_case
        .handle(
            header_str(&headers, header::AUTHORIZATION),
            header_str(&headers, header::CONTENT_TYPE),
            &body,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn publisher_health(State(state): State<Arc<PublisherState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": PUBLISHER_SERVICE,
        "version": env!("CARGO_PKG_VERSION"),
        "topic": state.publisher.topic(),
        "backend": state.publisher.sink_kind(),
        "delivery_failures": state.publisher.failures().count()
    }))
}

async fn metrics_text() -> Response {
    match crate::metrics::render() {
        Some(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}

/// Serve `router` on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(router: Router, listener: TcpListener, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    listener.set_nonblocking(true)?;
    let addr = listener.local_addr()?;
    info!(%addr, "listening");
    axum::Server::from_tcp(listener)?
        .serve(router.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;
    info!(%addr, "server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, SubmitError};

    #[test]
    fn errors_map_to_http_statuses() {
        assert_eq!(
            RelayError::Decode(DecodeError::MissingField("lastname")).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(RelayError::Auth.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            RelayError::PublishSubmit(SubmitError::Closed).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            RelayError::Config("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
