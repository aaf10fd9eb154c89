//! Mean-PFE breakdowns by currency pair and maturity bucket.

use crate::analytics::query::{PfeRecord, QueryError};
use crate::exposure::batch::PfeResult;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Which PFE column an aggregation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PfeTarget {
    Uncollateralized,
    Collateralized,
}

impl PfeTarget {
    pub fn value(self, result: &PfeResult) -> f64 {
        match self {
            PfeTarget::Uncollateralized => result.uncollateralized_pfe,
            PfeTarget::Collateralized => result.collateralized_pfe,
        }
    }
}

/// Time-to-maturity bucket over right-closed intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MaturityBucket {
    UpTo30,
    UpTo90,
    UpTo180,
    UpTo365,
    Over365,
}

impl MaturityBucket {
    /// `(0, 30]`, `(30, 90]`, `(90, 180]`, `(180, 365]`, `(365, ∞)`.
    /// Zero and negative day counts fall in no bucket.
    pub fn from_days(days: i64) -> Option<Self> {
        match days {
            d if d <= 0 => None,
            1..=30 => Some(MaturityBucket::UpTo30),
            31..=90 => Some(MaturityBucket::UpTo90),
            91..=180 => Some(MaturityBucket::UpTo180),
            181..=365 => Some(MaturityBucket::UpTo365),
            _ => Some(MaturityBucket::Over365),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MaturityBucket::UpTo30 => "0-30 days",
            MaturityBucket::UpTo90 => "31-90 days",
            MaturityBucket::UpTo180 => "91-180 days",
            MaturityBucket::UpTo365 => "181-365 days",
            MaturityBucket::Over365 => "365+ days",
        }
    }
}

impl fmt::Display for MaturityBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Group means ordered by descending mean, ties broken by label.
/// Serialized as a map that keeps this order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RankedMeans(#[serde(with = "ranked_serde")] Vec<(String, f64)>);

mod ranked_serde {
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;

    pub fn serialize<S: serde::Serializer>(
        entries: &[(String, f64)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (label, mean) in entries {
            map.serialize_entry(label, mean)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, f64)>, D::Error> {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = Vec<(String, f64)>;
            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of label to mean")
            }
            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
                let mut entries = Vec::new();
                while let Some(entry) = access.next_entry::<String, f64>()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }
        deserializer.deserialize_map(V)
    }
}

impl RankedMeans {
    fn from_groups(groups: BTreeMap<String, (f64, usize)>) -> Self {
        let mut entries: Vec<(String, f64)> = groups
            .into_iter()
            .map(|(label, (sum, count))| (label, sum / count as f64))
            .collect();
        // BTreeMap order is by label, and the sort is stable
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        Self(entries)
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.0
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, mean)| *mean)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactBreakdown {
    pub currency_pair_impact: RankedMeans,
    pub maturity_impact: RankedMeans,
}

impl ImpactBreakdown {
    pub fn compute(records: &[PfeRecord], target: PfeTarget) -> Self {
        let mut by_pair: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        let mut by_bucket: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        for record in records {
            let value = target.value(&record.result);
            accumulate(&mut by_pair, record.currency_pair_label(), value);
            if let Some(bucket) = MaturityBucket::from_days(record.time_to_maturity_days()) {
                accumulate(&mut by_bucket, bucket.label().to_string(), value);
            }
        }
        Self {
            currency_pair_impact: RankedMeans::from_groups(by_pair),
            maturity_impact: RankedMeans::from_groups(by_bucket),
        }
    }
}

fn accumulate(groups: &mut BTreeMap<String, (f64, usize)>, label: String, value: f64) {
    let entry = groups.entry(label).or_insert((0.0, 0));
    entry.0 += value;
    entry.1 += 1;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PfeSummary {
    /// Result rows in scope, one per trade and horizon day.
    pub total_trades: usize,
    pub unique_counterparties: usize,
    pub unique_currency_pairs: usize,
    /// Earliest and latest trading date.
    pub date_range: [NaiveDate; 2],
}

impl PfeSummary {
    fn compute(records: &[PfeRecord]) -> Option<Self> {
        let first = records.first()?;
        let mut counterparties = HashSet::new();
        let mut pairs = HashSet::new();
        let mut min_date = first.trading_date;
        let mut max_date = first.trading_date;
        for record in records {
            counterparties.insert(record.result.counterparty_id);
            pairs.insert(record.currency_pair_label());
            min_date = min_date.min(record.trading_date);
            max_date = max_date.max(record.trading_date);
        }
        Some(Self {
            total_trades: records.len(),
            unique_counterparties: counterparties.len(),
            unique_currency_pairs: pairs.len(),
            date_range: [min_date, max_date],
        })
    }
}

/// The aggregate analytics response for one query scope.
///
/// ```json
/// {
///   "Uncollateralized_PFE": {"currency_pair_impact": {..}, "maturity_impact": {..}},
///   "Collateralized_PFE": {..},
///   "summary": {"total_trades": 4, "unique_counterparties": 2, ..}
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PfeAnalysis {
    #[serde(rename = "Uncollateralized_PFE")]
    pub uncollateralized: ImpactBreakdown,
    #[serde(rename = "Collateralized_PFE")]
    pub collateralized: ImpactBreakdown,
    pub summary: PfeSummary,
}

impl PfeAnalysis {
    pub fn analyze(records: &[PfeRecord]) -> Result<Self, QueryError> {
        let summary = PfeSummary::compute(records).ok_or(QueryError::EmptyQueryScope)?;
        Ok(Self {
            uncollateralized: ImpactBreakdown::compute(records, PfeTarget::Uncollateralized),
            collateralized: ImpactBreakdown::compute(records, PfeTarget::Collateralized),
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::counterparty::{CounterpartyId, TransactionId};
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(
        tx: u64,
        cp: u64,
        pair: (&str, &str),
        trading: NaiveDate,
        maturity: NaiveDate,
        uncollat: f64,
        collat: f64,
    ) -> PfeRecord {
        PfeRecord {
            result: PfeResult {
                transaction_id: TransactionId::new(tx),
                counterparty_id: CounterpartyId::new(cp),
                buy_currency: pair.0.into(),
                sell_currency: pair.1.into(),
                maturity_date: maturity,
                days: 1,
                uncollateralized_pfe: uncollat,
                collateralized_pfe: collat,
            },
            trading_date: trading,
        }
    }

    #[test]
    fn test_bucket_boundaries_are_right_closed() {
        assert_eq!(MaturityBucket::from_days(0), None);
        assert_eq!(MaturityBucket::from_days(-4), None);
        assert_eq!(MaturityBucket::from_days(1), Some(MaturityBucket::UpTo30));
        assert_eq!(MaturityBucket::from_days(30), Some(MaturityBucket::UpTo30));
        assert_eq!(MaturityBucket::from_days(31), Some(MaturityBucket::UpTo90));
        assert_eq!(MaturityBucket::from_days(90), Some(MaturityBucket::UpTo90));
        assert_eq!(MaturityBucket::from_days(180), Some(MaturityBucket::UpTo180));
        assert_eq!(MaturityBucket::from_days(365), Some(MaturityBucket::UpTo365));
        assert_eq!(MaturityBucket::from_days(366), Some(MaturityBucket::Over365));
        assert_eq!(MaturityBucket::UpTo365.to_string(), "181-365 days");
    }

    #[test]
    fn test_analysis_means_and_order() {
        let t0 = date(2024, 1, 1);
        let records = vec![
            // 20 days to maturity
            record(1, 10, ("EUR", "USD"), t0, date(2024, 1, 21), 100.0, 40.0),
            record(1, 10, ("EUR", "USD"), t0, date(2024, 1, 21), 300.0, 60.0),
            // 200 days
            record(2, 10, ("USD", "JPY"), t0, date(2024, 7, 19), 500.0, 0.0),
            // 60 days, later trading date
            record(3, 20, ("EUR", "USD"), date(2024, 2, 1), date(2024, 4, 1), 50.0, 50.0),
        ];
        let analysis = PfeAnalysis::analyze(&records).unwrap();

        let pairs = &analysis.uncollateralized.currency_pair_impact;
        assert_eq!(pairs.entries()[0].0, "USD/JPY");
        assert_relative_eq!(pairs.get("USD/JPY").unwrap(), 500.0);
        assert_relative_eq!(pairs.get("EUR/USD").unwrap(), 150.0);

        let buckets = &analysis.uncollateralized.maturity_impact;
        let labels: Vec<&str> = buckets.entries().iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["181-365 days", "0-30 days", "31-90 days"]);
        assert_relative_eq!(buckets.get("0-30 days").unwrap(), 200.0);
        assert_eq!(buckets.get("365+ days"), None);

        let collat = &analysis.collateralized.currency_pair_impact;
        assert_eq!(collat.entries()[0].0, "EUR/USD");
        assert_relative_eq!(collat.get("EUR/USD").unwrap(), 50.0);

        let summary = &analysis.summary;
        // rows, so trade 1's two horizons both count
        assert_eq!(summary.total_trades, 4);
        assert_eq!(summary.unique_counterparties, 2);
        assert_eq!(summary.unique_currency_pairs, 2);
        assert_eq!(summary.date_range, [t0, date(2024, 2, 1)]);
    }

    #[test]
    fn test_non_positive_maturity_only_leaves_bucket_grouping() {
        let t0 = date(2024, 5, 1);
        let records = vec![record(1, 10, ("GBP", "USD"), t0, t0, 80.0, 80.0)];
        let analysis = PfeAnalysis::analyze(&records).unwrap();
        assert!(analysis.uncollateralized.maturity_impact.is_empty());
        assert_eq!(analysis.uncollateralized.currency_pair_impact.len(), 1);
    }

    #[test]
    fn test_ties_break_by_label() {
        let t0 = date(2024, 1, 1);
        let m = date(2024, 2, 1);
        let records = vec![
            record(1, 1, ("USD", "CHF"), t0, m, 10.0, 0.0),
            record(2, 1, ("AUD", "USD"), t0, m, 10.0, 0.0),
            record(3, 1, ("NZD", "USD"), t0, m, 10.0, 0.0),
        ];
        let analysis = PfeAnalysis::analyze(&records).unwrap();
        let labels: Vec<&str> = analysis
            .uncollateralized
            .currency_pair_impact
            .entries()
            .iter()
            .map(|(l, _)| l.as_str())
            .collect();
        assert_eq!(labels, vec!["AUD/USD", "NZD/USD", "USD/CHF"]);
    }

    #[test]
    fn test_empty_scope() {
        assert!(matches!(
            PfeAnalysis::analyze(&[]),
            Err(QueryError::EmptyQueryScope)
        ));
    }

    #[test]
    fn test_response_shape() {
        let t0 = date(2024, 1, 1);
        let records = vec![
            record(1, 10, ("EUR", "USD"), t0, date(2024, 3, 1), 10.0, 5.0),
            record(2, 11, ("USD", "JPY"), t0, date(2024, 3, 1), 30.0, 5.0),
        ];
        let analysis = PfeAnalysis::analyze(&records).unwrap();
        let json = serde_json::to_string(&analysis).unwrap();
        assert!(json.starts_with(
            r#"{"Uncollateralized_PFE":{"currency_pair_impact":{"USD/JPY":30.0,"EUR/USD":10.0}"#
        ));
        assert!(json.contains(r#""date_range":["2024-01-01","2024-01-01"]"#));

        let back: PfeAnalysis = serde_json::from_str(&json).unwrap();
        assert_eq!(back, analysis);
    }
}
