use analysis_core::{Metric, Trend};

use crate::block::FieldMap;

/// The only metric that carries a trend.
pub const SENTIMENT_LABEL: &str = "Sentiment";

/// Map every METRICS field to a metric, keeping block order.
pub fn to_metrics(fields: &FieldMap) -> Vec<Metric> {
    fields
        .iter()
        .map(|(label, value)| {
            let metric = Metric::new(label, value);
            if label == SENTIMENT_LABEL {
                metric.with_trend(sentiment_trend(value))
            } else {
                metric
            }
        })
        .collect()
}

/// Substring match, case-insensitive: "bull" wins over "bear".
pub fn sentiment_trend(value: &str) -> Trend {
    let lower = value.to_lowercase();
    if lower.contains("bull") {
        Trend::Up
    } else if lower.contains("bear") {
        Trend::Down
    } else {
        Trend::Neutral
    }
}
