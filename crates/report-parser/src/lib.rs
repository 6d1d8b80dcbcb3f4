//! Turns a grounded model reply into a structured analysis report.
//!
//! Every function here is pure: malformed or missing blocks degrade to empty
//! metrics or an absent income snapshot instead of failing.

use analysis_core::{AnalysisResult, GroundingSource, ModelResponse};

pub mod block;
pub mod income;
pub mod markdown;
pub mod metrics;
pub mod sources;

pub use block::{extract_block, FieldMap, TaggedBlock};
pub use income::to_income_snapshot;
pub use markdown::{render_markdown, RenderedBlock, Segment};
pub use metrics::{sentiment_trend, to_metrics};
pub use sources::dedupe_sources;

/// Parse the model's reply to `query` into the report shown to the user.
pub fn parse_report(query: &str, response: &ModelResponse) -> AnalysisResult {
    let (metric_fields, text) = TaggedBlock::METRICS.extract(&response.text);
    let (income_fields, text) = TaggedBlock::INCOME.extract(&text);

    if metric_fields.is_empty() {
        tracing::warn!("No metrics block found in model response for {}", query);
    }

    let metrics = to_metrics(&metric_fields);
    let income = to_income_snapshot(&income_fields);

    let citations: Vec<GroundingSource> = response
        .citations
        .iter()
        .cloned()
        .map(GroundingSource::from)
        .collect();
    let sources = dedupe_sources(&citations);

    tracing::debug!(
        "Parsed report for {}: {} metrics, income {}, {} sources ({} citations)",
        query,
        metrics.len(),
        if income.is_some() { "present" } else { "absent" },
        sources.len(),
        citations.len()
    );

    let name = query.to_uppercase();
    AnalysisResult {
        company_name: name.clone(),
        ticker: name,
        markdown_content: text.trim().to_string(),
        metrics,
        income,
        sources,
    }
}
