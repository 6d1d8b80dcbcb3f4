use serde::{Deserialize, Serialize};

/// Web citation attached by the model's search grounding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Citation {
    pub uri: String,
    pub title: String,
}

/// Raw reply of the hosted model: free text plus its grounding citations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelResponse {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// Direction indicator attached to a metric for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

/// Colour family a front-end uses for a metric card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    Negative,
    Muted,
    /// Uncoloured value text, used for every metric except `Sentiment`.
    Plain,
}

/// Headline metric extracted from the METRICS block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Metric {
    pub label: String,
    pub value: String,
    /// Only set for `Sentiment`; absent everywhere else.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

impl Metric {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            trend: None,
        }
    }

    pub fn with_trend(mut self, trend: Trend) -> Self {
        self.trend = Some(trend);
        self
    }

    /// Only `Sentiment` is coloured. Its value text overrides the trend, and
    /// "bear" wins when the value mentions both.
    pub fn tone(&self) -> Tone {
        if self.label != "Sentiment" {
            return Tone::Plain;
        }

        let value = self.value.to_lowercase();
        if value.contains("bear") {
            Tone::Negative
        } else if value.contains("bull") {
            Tone::Positive
        } else {
            match self.trend {
                Some(Trend::Up) => Tone::Positive,
                Some(Trend::Down) => Tone::Negative,
                Some(Trend::Neutral) | None => Tone::Muted,
            }
        }
    }
}

/// Trailing-twelve-month income statement figures, as display strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct IncomeSnapshot {
    pub revenue: String,
    pub revenue_growth: String,
    pub gross_margin: String,
    pub operating_margin: String,
    pub net_income: String,
    pub net_margin: String,
}

/// One margin progress bar: label, display value and fill width in percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MarginBar {
    pub label: String,
    pub value: String,
    pub width: f64,
}

impl IncomeSnapshot {
    /// Gross, operating and net profit margin bars, in display order.
    pub fn margin_bars(&self) -> Vec<MarginBar> {
        [
            ("Gross Margin", &self.gross_margin),
            ("Operating Margin", &self.operating_margin),
            ("Net Profit Margin", &self.net_margin),
        ]
        .into_iter()
        .map(|(label, value)| MarginBar {
            label: label.to_string(),
            value: value.clone(),
            width: margin_bar_width(value),
        })
        .collect()
    }
}

/// Fill width (0-100) for a margin display string such as `"45.3%"`.
///
/// Everything except digits, `.` and `-` is discarded and the longest numeric
/// prefix of what remains is parsed. Values that do not parse give 0.
pub fn margin_bar_width(value: &str) -> f64 {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let parsed = (1..=cleaned.len())
        .rev()
        .find_map(|end| cleaned[..end].parse::<f64>().ok());

    match parsed {
        Some(n) if n.is_finite() => n.clamp(0.0, 100.0),
        _ => 0.0,
    }
}

/// Citation record shown in the sources panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GroundingSource {
    pub title: String,
    pub url: String,
}

impl From<Citation> for GroundingSource {
    fn from(citation: Citation) -> Self {
        Self {
            title: citation.title,
            url: citation.uri,
        }
    }
}

/// Parsed report handed to the display layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// The query, uppercased. No ticker resolution takes place.
    pub company_name: String,
    pub ticker: String,
    /// Narrative with every tagged block stripped, trimmed once.
    pub markdown_content: String,
    pub metrics: Vec<Metric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income: Option<IncomeSnapshot>,
    pub sources: Vec<GroundingSource>,
}
