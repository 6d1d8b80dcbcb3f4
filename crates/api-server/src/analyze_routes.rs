//! Analysis API Routes
//!
//! Endpoints that run a grounded company analysis and return the parsed report.

use analysis_core::{AnalysisResult, MarginBar, Metric, Tone};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use report_parser::{render_markdown, RenderedBlock};
use serde::{Deserialize, Serialize};

use crate::request_id::RequestId;
use crate::{ApiResponse, AppError, AppState};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AnalyzeRequest {
    /// Ticker or company name, e.g. `AAPL` or `Nvidia`
    pub query: String,
}

/// Metric plus the tone its card is drawn in
#[derive(Serialize, utoipa::ToSchema)]
pub struct MetricCard {
    #[serde(flatten)]
    pub metric: Metric,
    pub tone: Tone,
}

#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    #[serde(flatten)]
    pub report: AnalysisResult,
    pub cards: Vec<MetricCard>,
    /// Empty when there is no income snapshot
    pub margin_bars: Vec<MarginBar>,
    pub blocks: Vec<RenderedBlock>,
    pub analyzed_at: DateTime<Utc>,
}

impl From<AnalysisResult> for ReportResponse {
    fn from(report: AnalysisResult) -> Self {
        let blocks = render_markdown(&report.markdown_content);
        let cards = report
            .metrics
            .iter()
            .map(|m| MetricCard {
                tone: m.tone(),
                metric: m.clone(),
            })
            .collect();
        let margin_bars = report
            .income
            .as_ref()
            .map(|income| income.margin_bars())
            .unwrap_or_default();

        Self {
            report,
            cards,
            margin_bars,
            blocks,
            analyzed_at: Utc::now(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
}

pub fn analyze_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/analyze", post(analyze_post))
        .route("/api/analyze/:query", get(analyze_get))
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "Analysis"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.orchestrator.backend_name().to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/api/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Parsed analysis report", body = ReportResponse),
        (status = 400, description = "Empty query"),
        (status = 502, description = "The model call failed")
    ),
    tag = "Analysis"
)]
pub async fn analyze_post(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<ApiResponse<ReportResponse>>, AppError> {
    run_analysis(&state, &request_id, &body.query).await
}

#[utoipa::path(
    get,
    path = "/api/analyze/{query}",
    params(("query" = String, Path, description = "Ticker or company name")),
    responses(
        (status = 200, description = "Parsed analysis report", body = ReportResponse),
        (status = 400, description = "Empty query"),
        (status = 502, description = "The model call failed")
    ),
    tag = "Analysis"
)]
pub async fn analyze_get(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(query): Path<String>,
) -> Result<Json<ApiResponse<ReportResponse>>, AppError> {
    run_analysis(&state, &request_id, &query).await
}

async fn run_analysis(
    state: &AppState,
    request_id: &RequestId,
    query: &str,
) -> Result<Json<ApiResponse<ReportResponse>>, AppError> {
    tracing::info!("[{}] Analysis requested for {:?}", request_id.0, query);

    let report = state.orchestrator.analyze(query).await.map_err(|e| {
        tracing::warn!("[{}] Analysis failed: {}", request_id.0, e);
        AppError::from(e)
    })?;

    Ok(Json(ApiResponse::success(ReportResponse::from(report))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{app, ServerConfig};
    use analysis_core::{
        AnalysisError, Citation, ModelResponse, ReportModel, GENERIC_FAILURE_MESSAGE,
    };
    use analysis_orchestrator::AnalysisOrchestrator;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    const REPLY: &str = r#"## Executive Summary
Apple is **dominant** in premium hardware.
*   **Threats**: Regulation.

---METRICS_START---
Price: $189.20
Market Cap: $2.9T
Sentiment: Bullish
---METRICS_END---
---INCOME_START---
Revenue: $383.3B
Revenue Growth: 2.1%
Gross Margin: 45.6%
Net Margin: 25.3%
---INCOME_END---"#;

    struct StubModel {
        fail: bool,
    }

    #[async_trait]
    impl ReportModel for StubModel {
        async fn generate(&self, _prompt: &str) -> Result<ModelResponse, AnalysisError> {
            if self.fail {
                return Err(AnalysisError::Upstream("connection reset".to_string()));
            }
            Ok(ModelResponse {
                text: REPLY.to_string(),
                citations: vec![
                    Citation { uri: "https://a.example".into(), title: "A".into() },
                    Citation { uri: "https://a.example".into(), title: "A2".into() },
                ],
            })
        }

        fn backend_name(&self) -> &'static str {
            "stub"
        }
    }

    fn test_app(fail: bool) -> Router {
        let orchestrator = AnalysisOrchestrator::new(Arc::new(StubModel { fail }));
        app(crate::AppState::new(orchestrator, ServerConfig::default()))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_analyze(query: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::json!({ "query": query }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_post_analyze_returns_report() {
        let response = test_app(false).oneshot(post_analyze("aapl")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()["cache-control"], "no-store");

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        let data = &json["data"];
        assert_eq!(data["ticker"], "AAPL");
        assert_eq!(data["companyName"], "AAPL");
        assert_eq!(data["metrics"].as_array().unwrap().len(), 3);
        assert!(data["metrics"][0].get("trend").is_none());
        assert_eq!(data["metrics"][2]["trend"], "up");
        assert_eq!(data["cards"][2]["tone"], "positive");
        assert_eq!(data["income"]["operatingMargin"], "0%");
        assert_eq!(data["marginBars"].as_array().unwrap().len(), 3);
        assert_eq!(data["sources"].as_array().unwrap().len(), 1);
        assert_eq!(data["sources"][0]["title"], "A2");
        assert_eq!(data["blocks"][0]["type"], "heading");
        assert_eq!(data["blocks"][1]["segments"][1]["text"], "dominant");
        assert_eq!(data["blocks"][1]["segments"][1]["emphasis"], true);
        assert!(data.get("html").is_none());
        assert_eq!(data["cards"][0]["tone"], "plain");
        assert!(!data["markdownContent"].as_str().unwrap().contains("METRICS_START"));
        assert!(data["analyzedAt"].is_string());
    }

    #[tokio::test]
    async fn test_get_analyze_by_path() {
        let request = Request::builder()
            .uri("/api/analyze/nvidia%20corp")
            .body(Body::empty())
            .unwrap();
        let response = test_app(false).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["data"]["ticker"], "NVIDIA CORP");
    }

    #[tokio::test]
    async fn test_blank_query_is_bad_request() {
        let response = test_app(false).oneshot(post_analyze("   ")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json.get("data").is_none());
    }

    #[tokio::test]
    async fn test_upstream_failure_is_bad_gateway_with_generic_message() {
        let response = test_app(true).oneshot(post_analyze("AAPL")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let json = body_json(response).await;
        assert_eq!(json["error"], GENERIC_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let mut request = post_analyze("AAPL");
        request
            .headers_mut()
            .insert("x-request-id", "req-123".parse().unwrap());
        let response = test_app(false).oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-123");
    }

    #[tokio::test]
    async fn test_health_reports_backend() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = test_app(false).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-frame-options"], "DENY");

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["model"], "stub");
    }

    #[tokio::test]
    async fn test_openapi_document_lists_routes() {
        let request = Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap();
        let response = test_app(false).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert!(json["paths"].get("/api/analyze").is_some());
        assert!(json["paths"].get("/api/analyze/{query}").is_some());
    }
}
