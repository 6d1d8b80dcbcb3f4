use analysis_core::IncomeSnapshot;

pub use analysis_core::margin_bar_width;

use crate::block::FieldMap;

/// Fewer populated fields than this and no snapshot is produced.
pub const MIN_INCOME_FIELDS: usize = 4;

const MONEY_FALLBACK: &str = "N/A";
const MARGIN_FALLBACK: &str = "0%";

/// Build the income snapshot, or `None` when the block is too sparse to show.
pub fn to_income_snapshot(fields: &FieldMap) -> Option<IncomeSnapshot> {
    if fields.len() < MIN_INCOME_FIELDS {
        return None;
    }

    let field = |key: &str, fallback: &str| fields.get(key).unwrap_or(fallback).to_string();

    Some(IncomeSnapshot {
        revenue: field("Revenue", MONEY_FALLBACK),
        revenue_growth: field("Revenue Growth", MONEY_FALLBACK),
        gross_margin: field("Gross Margin", MARGIN_FALLBACK),
        operating_margin: field("Operating Margin", MARGIN_FALLBACK),
        net_income: field("Net Income", MONEY_FALLBACK),
        net_margin: field("Net Margin", MARGIN_FALLBACK),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::parse_fields;

    #[test]
    fn test_three_fields_gives_none() {
        let fields = parse_fields("Revenue: $383B\nRevenue Growth: 2%\nGross Margin: 45%");
        assert!(to_income_snapshot(&fields).is_none());
    }

    #[test]
    fn test_four_fields_fill_remaining_with_fallbacks() {
        let fields = parse_fields("Revenue: $383B\nRevenue Growth: 2%\nGross Margin: 45%\nNet Income: $97B");
        let snapshot = to_income_snapshot(&fields).unwrap();
        assert_eq!(snapshot.revenue, "$383B");
        assert_eq!(snapshot.revenue_growth, "2%");
        assert_eq!(snapshot.gross_margin, "45%");
        assert_eq!(snapshot.net_income, "$97B");
        assert_eq!(snapshot.operating_margin, "0%");
        assert_eq!(snapshot.net_margin, "0%");
    }

    #[test]
    fn test_money_fallbacks() {
        let fields = parse_fields("Gross Margin: 45%\nOperating Margin: 30%\nNet Margin: 25%\nEBITDA: $130B");
        let snapshot = to_income_snapshot(&fields).unwrap();
        assert_eq!(snapshot.revenue, "N/A");
        assert_eq!(snapshot.revenue_growth, "N/A");
        assert_eq!(snapshot.net_income, "N/A");
    }

    #[test]
    fn test_unknown_keys_count_toward_gate_but_are_ignored() {
        let fields = parse_fields("EBITDA: 1\nEPS: 2\nFree Cash Flow: 3\nDebt: 4");
        let snapshot = to_income_snapshot(&fields).unwrap();
        assert_eq!(
            snapshot,
            IncomeSnapshot {
                revenue: "N/A".into(),
                revenue_growth: "N/A".into(),
                gross_margin: "0%".into(),
                operating_margin: "0%".into(),
                net_income: "N/A".into(),
                net_margin: "0%".into(),
            }
        );
    }

    #[test]
    fn test_key_match_is_exact() {
        let fields = parse_fields("revenue: $1B\nRevenue: $2B\nGross margin: 10%\nNet Income: $1B");
        let snapshot = to_income_snapshot(&fields).unwrap();
        assert_eq!(snapshot.revenue, "$2B");
        assert_eq!(snapshot.gross_margin, "0%");
    }
}
