pub mod config;
mod financial_routes;
mod request_id;


use axum::{
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    Json, Router,
};
use fmp_client::{mask_api_key, FmpClient};
use serde_json::json;
use statement_core::{StatementError, StatementSource};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use financial_routes::financial_routes;

/// Shared, read-only state. The only thing requests share is the upstream source.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn StatementSource>,
}

impl AppState {
    pub fn new(source: Arc<dyn StatementSource>) -> Self {
        Self { source }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Statement(#[from] StatementError),

    #[error("Invalid query string: {0}")]
    Query(#[from] axum::extract::rejection::QueryRejection),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Statement(e) if e.is_client_error() => (StatusCode::BAD_REQUEST, e.kind()),
            AppError::Statement(e) => (StatusCode::BAD_GATEWAY, e.kind()),
            AppError::Query(_) => (StatusCode::BAD_REQUEST, "INVALID_PARAMETER"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if let AppError::Internal(e) = &self {
            tracing::error!("{}: {:#}", code, e);
        } else if status.is_server_error() {
            tracing::error!("{}: {:#}", code, self);
        } else {
            tracing::warn!("{}: {}", code, self);
        }

        let body = Json(json!({
            "error": code,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Turns a panicking handler into a 500 with the usual error body.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    AppError::Internal(anyhow::anyhow!("Handler panicked: {}", detail)).into_response()
}

fn cors_layer(frontend_origin: HeaderValue) -> CorsLayer {
    // Credentials rule out wildcards, so methods and headers are mirrored from the preflight.
    CorsLayer::new()
        .allow_origin(frontend_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn create_router(state: AppState, frontend_origin: HeaderValue) -> Router {
    Router::new()
        .merge(financial_routes())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(frontend_origin))
        .with_state(state)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    tracing::info!("Starting Financial Data API");
    tracing::info!(
        "  Upstream: {} ({} {}, key {})",
        config.fmp.base_url,
        config.fmp.symbol,
        config.fmp.period,
        mask_api_key(&config.fmp.api_key)
    );
    tracing::info!("  CORS origin: {:?}", config.frontend_origin);

    let client = FmpClient::new(config.fmp.clone())?;
    let state = AppState::new(Arc::new(client));
    let app = create_router(state, config.frontend_origin.clone());

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
