//! HTTP front door for company analyses.
//!
//! The browser submits a ticker or company name and receives the parsed report
//! together with the rendered narrative blocks.

use std::sync::Arc;

use analysis_core::AnalysisError;
use analysis_orchestrator::AnalysisOrchestrator;
use axum::{
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod analyze_routes;
pub mod config;
pub mod request_id;
pub mod security_headers;

pub use config::ServerConfig;

/// Shared, read-only state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(orchestrator: AnalysisOrchestrator, config: ServerConfig) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            config: Arc::new(config),
        }
    }
}

/// Envelope for every JSON response
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Handler error rendered as an `ApiResponse` with a matching status code
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        let status = match &err {
            AnalysisError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            AnalysisError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::error(self.message))).into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        analyze_routes::health,
        analyze_routes::analyze_post,
        analyze_routes::analyze_get,
    ),
    components(schemas(
        analyze_routes::AnalyzeRequest,
        analyze_routes::ReportResponse,
        analyze_routes::HealthResponse,
        analysis_core::AnalysisResult,
        analysis_core::Metric,
        analysis_core::Trend,
        analysis_core::Tone,
        analyze_routes::MetricCard,
        analysis_core::IncomeSnapshot,
        analysis_core::MarginBar,
        analysis_core::GroundingSource,
        report_parser::RenderedBlock,
        report_parser::Segment,
    )),
    tags((name = "Analysis", description = "Grounded company analysis reports"))
)]
pub struct ApiDoc;

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid origin in ALLOWED_ORIGINS: {}", o);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Full application router with middleware.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .merge(analyze_routes::analyze_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers::security_headers_middleware,
        ))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Initialise tracing. `RUST_LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=info".into());

    if json_logging {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

/// Load configuration, build the router and serve until Ctrl-C.
pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    let orchestrator = AnalysisOrchestrator::from_env()?;
    let addr = config.socket_addr()?;

    tracing::info!(
        "Starting EquiVal API server (backend: {})",
        orchestrator.backend_name()
    );

    let app = app(AppState::new(orchestrator, config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
