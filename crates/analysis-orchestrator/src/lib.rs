use analysis_core::{AnalysisError, AnalysisResult, ReportModel};
use gemini_client::{analysis_prompt, GeminiClient, GeminiConfig};
use std::sync::Arc;

/// Runs one grounded analysis per query: prompt the model once, then parse.
///
/// Holds no mutable state, so one instance serves concurrent requests.
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    model: Arc<dyn ReportModel>,
}

impl AnalysisOrchestrator {
    pub fn new(model: Arc<dyn ReportModel>) -> Self {
        Self { model }
    }

    /// Build an orchestrator backed by Gemini, configured from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = GeminiConfig::from_env()?;
        tracing::info!("Using Gemini model {}", config.model);
        let client = GeminiClient::new(config)?;
        Ok(Self::new(Arc::new(client)))
    }

    pub fn backend_name(&self) -> &'static str {
        self.model.backend_name()
    }

    /// Analyze a ticker or company name.
    ///
    /// Any failure of the model call is logged in full and surfaced as
    /// [`AnalysisError::Upstream`] with the generic user-facing message. Parse
    /// gaps never fail the analysis.
    pub async fn analyze(&self, query: &str) -> Result<AnalysisResult, AnalysisError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AnalysisError::InvalidQuery(
                "query must name a ticker or company".to_string(),
            ));
        }

        tracing::info!("Analyzing {}", query);
        let started = std::time::Instant::now();

        let prompt = analysis_prompt(query);
        let response = match self.model.generate(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    "{} analysis of {} failed: {}",
                    self.model.backend_name(),
                    query,
                    e
                );
                return Err(AnalysisError::upstream());
            }
        };

        let result = report_parser::parse_report(query, &response);

        tracing::info!(
            "Analysis of {} complete in {:.1}s ({} metrics, {} sources)",
            query,
            started.elapsed().as_secs_f64(),
            result.metrics.len(),
            result.sources.len()
        );

        Ok(result)
    }
}
