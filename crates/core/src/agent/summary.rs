use crate::domain::result::{OptimizationResult, OrgContext};
use crate::llm::{ResultDigest, SummaryContext};
use chrono::{DateTime, Utc};

pub const NO_OPPORTUNITIES: &str = "No optimization opportunities were found.";

const MAX_SUMMARY_LINES: usize = 5;
const MAX_DIGEST_RECOMMENDATIONS: usize = 3;

/// Deterministic plain-text summary; depends only on `results`.
pub fn base_summary(results: &[OptimizationResult]) -> String {
    if results.is_empty() {
        return NO_OPPORTUNITIES.to_string();
    }

    let total_savings: f64 = results.iter().map(|r| r.savings).sum();
    let mut lines = Vec::with_capacity(results.len().min(MAX_SUMMARY_LINES) + 1);
    lines.push(format!(
        "Found {} opportunities across providers with total potential savings ${}.",
        results.len(),
        format_usd(total_savings)
    ));
    for r in results.iter().take(MAX_SUMMARY_LINES) {
        lines.push(format!(
            "- {}: save ${} on {}; confidence {}.",
            r.provider.to_uppercase(),
            format_usd(r.savings),
            r.resource_type,
            format_percent(r.confidence_score)
        ));
    }
    lines.join("\n")
}

pub fn summary_context(
    results: &[OptimizationResult],
    org: Option<&OrgContext>,
    now: DateTime<Utc>,
) -> SummaryContext {
    SummaryContext {
        org: org.map(|o| o.name.clone()).unwrap_or_default(),
        date: now,
        results: results
            .iter()
            .map(|r| ResultDigest {
                provider: r.provider.clone(),
                resource_type: r.resource_type.clone(),
                savings: r.savings,
                recommendations: r
                    .recommendations
                    .iter()
                    .take(MAX_DIGEST_RECOMMENDATIONS)
                    .cloned()
                    .collect(),
                confidence: r.confidence_score,
            })
            .collect(),
    }
}

/// `1234.5` -> `1,234.50`.
pub fn format_usd(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

/// `0.825` -> `82%`.
pub fn format_percent(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn result(provider: &str, savings: f64, recs: usize) -> OptimizationResult {
        OptimizationResult {
            provider: provider.to_string(),
            resource_type: "multi-service".to_string(),
            current_cost: 1000.0,
            optimized_cost: 1000.0 - savings,
            savings,
            recommendations: (1..=recs).map(|i| format!("rec {i}")).collect(),
            confidence_score: 0.9,
            timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn formats_currency_with_grouping() {
        assert_eq!(format_usd(0.0), "0.00");
        assert_eq!(format_usd(999.999), "1,000.00");
        assert_eq!(format_usd(1234567.891), "1,234,567.89");
        assert_eq!(format_usd(-1500.0), "-1,500.00");
        assert_eq!(format_percent(0.9), "90%");
        assert_eq!(format_percent(1.0), "100%");
    }

    #[test]
    fn base_summary_lists_at_most_five_results() {
        let results: Vec<_> = (0..7).map(|i| result(&format!("p{i}"), 100.0, 1)).collect();
        let text = base_summary(&results);
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 6);
        assert_eq!(
            lines[0],
            "Found 7 opportunities across providers with total potential savings $700.00."
        );
        assert_eq!(lines[1], "- P0: save $100.00 on multi-service; confidence 90%.");
        assert!(!text.contains("P5"));
    }

    #[test]
    fn empty_results_use_canonical_message() {
        assert_eq!(base_summary(&[]), NO_OPPORTUNITIES);
    }

    #[test]
    fn context_keeps_first_three_recommendations() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let ctx = summary_context(&[result("aws", 10.0, 5)], Some(&OrgContext::named("Acme")), now);
        assert_eq!(ctx.org, "Acme");
        assert_eq!(ctx.date, now);
        assert_eq!(ctx.results[0].recommendations, vec!["rec 1", "rec 2", "rec 3"]);

        let anonymous = summary_context(&[result("aws", 10.0, 1)], None, now);
        assert_eq!(anonymous.org, "");
    }
}
