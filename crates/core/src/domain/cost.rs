use anyhow::ensure;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Inclusive calendar-date window for a cost query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> anyhow::Result<Self> {
        ensure!(start <= end, "invalid date range: start {start} is after end {end}");
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> anyhow::Result<Self> {
        let start = NaiveDate::parse_from_str(start.trim(), DATE_FORMAT)?;
        let end = NaiveDate::parse_from_str(end.trim(), DATE_FORMAT)?;
        Self::new(start, end)
    }

    /// Trailing window ending on `today`, both ends inclusive.
    pub fn trailing_days(today: NaiveDate, days: i64) -> Self {
        Self {
            start: today - Duration::days(days),
            end: today,
        }
    }

    pub fn period(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// `[today - 30d, today]`.
pub fn default_date_range(today: NaiveDate) -> DateRange {
    DateRange::trailing_days(today, DEFAULT_WINDOW_DAYS)
}

/// Point-in-time cost report for one backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSnapshot {
    pub provider: String,
    pub total_cost: f64,
    pub resource_count: u64,
    pub period: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub service_breakdown: BTreeMap<String, f64>,

    /// Regions, resource groups or whatever grouping the backend reports.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub group_breakdown: BTreeMap<String, f64>,
}

impl CostSnapshot {
    pub fn has_service_breakdown(&self) -> bool {
        !self.service_breakdown.is_empty()
    }

    pub fn has_group_breakdown(&self) -> bool {
        !self.group_breakdown.is_empty()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.provider.trim().is_empty(), "provider must be non-empty");
        ensure!(
            self.total_cost.is_finite() && self.total_cost >= 0.0,
            "total_cost must be a non-negative number (got {})",
            self.total_cost
        );
        Ok(())
    }
}

pub(crate) fn breakdown<const N: usize>(entries: [(&str, f64); N]) -> BTreeMap<String, f64> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_range_covers_trailing_thirty_days() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        let range = default_date_range(today);
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(range.end, today);
        assert_eq!(range.period(), "2026-03-01 to 2026-03-31");
    }

    #[test]
    fn parse_rejects_inverted_range() {
        assert!(DateRange::parse("2026-02-10", "2026-02-01").is_err());
        assert!(DateRange::parse("2026-02-01", "2026-02-01").is_ok());
        assert!(DateRange::parse("02/01/2026", "2026-02-10").is_err());
    }

    #[test]
    fn snapshot_deserializes_without_breakdowns() {
        let v = serde_json::json!({
            "provider": "aws",
            "total_cost": 12.5,
            "resource_count": 3,
            "period": "2026-01-01 to 2026-01-31",
        });
        let snapshot: CostSnapshot = serde_json::from_value(v).unwrap();
        assert!(!snapshot.has_service_breakdown());
        assert!(!snapshot.has_group_breakdown());
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn validate_rejects_negative_cost_and_blank_provider() {
        let mut snapshot = CostSnapshot {
            provider: " ".to_string(),
            total_cost: 1.0,
            resource_count: 0,
            period: String::new(),
            service_breakdown: BTreeMap::new(),
            group_breakdown: BTreeMap::new(),
        };
        assert!(snapshot.validate().is_err());
        snapshot.provider = "gcp".to_string();
        snapshot.total_cost = -1.0;
        assert!(snapshot.validate().is_err());
    }
}
