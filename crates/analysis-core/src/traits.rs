use async_trait::async_trait;
use crate::{AnalysisError, ModelResponse};

/// A hosted language model able to answer a grounded analysis prompt.
///
/// Implemented by the Gemini HTTP client; tests plug in canned responses.
#[async_trait]
pub trait ReportModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<ModelResponse, AnalysisError>;

    fn backend_name(&self) -> &'static str;
}
