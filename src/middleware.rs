use anyhow::Context;
use axum::{
    error_handling::HandleErrorLayer,
    http::{header, HeaderValue, Method},
    response::{IntoResponse, Response},
    BoxError, Router,
};
use tower::{timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, CorsConfig};
use crate::error::ApiError;

/// Log filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "emopop_api=debug,tower_http=debug,info";

/// Wraps the router in the tracing, CORS and request-timeout layers.
/// A timeout is answered with the same JSON error body as every other failure.
pub fn apply_middleware(router: Router, config: &Config) -> anyhow::Result<Router> {
    Ok(router.layer(
        ServiceBuilder::new()
            // Request/response logging with tracing
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(create_cors_layer(&config.cors)?)
            .layer(HandleErrorLayer::new(handle_middleware_error))
            .layer(TimeoutLayer::new(config.request_timeout)),
    ))
}

async fn handle_middleware_error(err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        ApiError::Timeout.into_response()
    } else {
        ApiError::Internal(anyhow::anyhow!("Unhandled middleware error: {}", err)).into_response()
    }
}

/// Only the configured browser origins may call the API, and only with
/// GET/POST/OPTIONS and a `Content-Type` header.
pub fn create_cors_layer(cors: &CorsConfig) -> anyhow::Result<CorsLayer> {
    let origins = cors
        .allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid CORS origin '{}'", origin))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(false))
}

/// Initialize structured logging with JSON format. Call once, before anything logs.
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
        )
        .try_init()?;

    tracing::info!("Structured logging initialized with JSON format");
    Ok(())
}
