/// Build the grounded evaluation prompt for a ticker or company name.
///
/// The trailing METRICS and INCOME blocks are the machine-readable part of the
/// reply; their delimiters must match the ones the report parser looks for.
pub fn analysis_prompt(query: &str) -> String {
    format!(
        r#"
Analyze the public company "{query}" (Ticker or Name).

Goal: Provide a comprehensive investment evaluation for a professional investor.

Structure your response strictly in the following format:

1.  **Executive Summary**: A concise 2-3 sentence overview of the company's current status and primary business model.
2.  **Financial Health**: detailed analysis of revenue growth, profitability (margins), and balance sheet strength.
3.  **SWOT Analysis**:
    *   **Strengths**: Internal strategic advantages.
    *   **Weaknesses**: Internal limitations.
    *   **Opportunities**: External growth vectors.
    *   **Threats**: External risks (competitors, regulation).
4.  **Recent Developments**: Summarize the most significant news from the last 3-6 months based on search results.
5.  **Investment Verdict**: A purely educational "Bull case" vs "Bear case" summary.

At the VERY END of your response, after all text, output two special blocks strictly for data extraction. Use exactly this format:

---METRICS_START---
Price: [Current Stock Price with currency symbol]
Market Cap: [Current Market Cap]
P/E Ratio: [Current P/E or 'N/A']
YoY Growth: [Revenue Growth % or 'N/A']
Sentiment: [Bullish/Bearish/Neutral based on analysis]
---METRICS_END---
---INCOME_START---
Revenue: [Trailing twelve month revenue with currency symbol]
Revenue Growth: [YoY revenue growth %]
Gross Margin: [Gross margin %]
Operating Margin: [Operating margin %]
Net Income: [Trailing twelve month net income with currency symbol]
Net Margin: [Net profit margin %]
---INCOME_END---
"#
    )
}
