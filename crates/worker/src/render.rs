//! Plain-text tables for `--output table`.

use cloudopt_core::agent::summary::{format_percent, format_usd};
use cloudopt_core::domain::cost::CostSnapshot;
use cloudopt_core::domain::result::{OptimizationResult, ProactiveCycleOutcome};
use std::fmt::Write;

pub fn snapshot_table(s: &CostSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "provider:   {}", s.provider);
    let _ = writeln!(out, "period:     {}", s.period);
    let _ = writeln!(out, "total cost: ${}", format_usd(s.total_cost));
    let _ = writeln!(out, "resources:  {}", s.resource_count);
    for (title, rows) in [
        ("services", &s.service_breakdown),
        ("groups", &s.group_breakdown),
    ] {
        if rows.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{title}:");
        let width = rows.keys().map(|k| k.len()).max().unwrap_or(0);
        for (name, cost) in rows {
            let _ = writeln!(out, "  {name:<width$}  ${}", format_usd(*cost));
        }
    }
    out.trim_end().to_string()
}

pub fn results_table(results: &[OptimizationResult]) -> String {
    if results.is_empty() {
        return "no results".to_string();
    }
    let mut out = format!(
        "{:<10} {:<16} {:>12} {:>12} {:>12} {:>6}",
        "PROVIDER", "RESOURCE", "CURRENT", "SAVINGS", "OPTIMIZED", "CONF"
    );
    for r in results {
        let _ = write!(
            out,
            "\n{:<10} {:<16} {:>12} {:>12} {:>12} {:>6}",
            r.provider,
            r.resource_type,
            format_usd(r.current_cost),
            format_usd(r.savings),
            format_usd(r.optimized_cost),
            format_percent(r.confidence_score)
        );
        for rec in &r.recommendations {
            let _ = write!(out, "\n    - {rec}");
        }
    }
    out
}

pub fn outcome_table(o: &ProactiveCycleOutcome) -> String {
    let mut out = format!("{}\n\nresults: {}", o.summary, o.count);
    if o.notify_status.is_empty() {
        out.push_str("\nnotifications: none");
    }
    for (channel, delivered) in &o.notify_status {
        let status = if *delivered { "delivered" } else { "failed" };
        let _ = write!(out, "\n  {channel}: {status}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn outcome_lists_each_channel() {
        let outcome = ProactiveCycleOutcome {
            summary: "Found 1 opportunities".to_string(),
            notify_status: BTreeMap::from([("log".to_string(), true), ("slack".to_string(), false)]),
            count: 1,
        };
        let text = outcome_table(&outcome);
        assert!(text.ends_with("results: 1\n  log: delivered\n  slack: failed"));
    }

    #[test]
    fn empty_results_print_placeholder() {
        assert_eq!(results_table(&[]), "no results");
    }
}
