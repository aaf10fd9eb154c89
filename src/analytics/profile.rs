//! Per-horizon views of stored results.

use crate::analytics::query::PfeRecord;
use crate::core::counterparty::TransactionId;
use crate::core::trade::Trade;
use crate::exposure::batch::PfeResult;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Horizons reported in a [`TradePfeSnapshot`].
pub const SNAPSHOT_HORIZONS: [u32; 3] = [5, 15, 30];

/// Mean PFE over every record in scope at one horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizonPoint {
    pub day: u32,
    #[serde(rename = "Uncollateralized_PFE")]
    pub uncollateralized: f64,
    #[serde(rename = "Collateralized_PFE")]
    pub collateralized: f64,
}

/// Mean PFE by horizon, ascending by day.
pub fn horizon_profile(records: &[PfeRecord]) -> Vec<HorizonPoint> {
    let mut by_day: BTreeMap<u32, (f64, f64, usize)> = BTreeMap::new();
    for record in records {
        let entry = by_day.entry(record.result.days).or_insert((0.0, 0.0, 0));
        entry.0 += record.result.uncollateralized_pfe;
        entry.1 += record.result.collateralized_pfe;
        entry.2 += 1;
    }
    by_day
        .into_iter()
        .map(|(day, (uncollat, collat, count))| HorizonPoint {
            day,
            uncollateralized: uncollat / count as f64,
            collateralized: collat / count as f64,
        })
        .collect()
}

/// A trade with its PFE at the [`SNAPSHOT_HORIZONS`].
///
/// Serialized flat: the trade's fields followed by `UncollatPFE_5D`,
/// `CollatPFE_5D`, ... with `null` where no result exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradePfeSnapshot {
    #[serde(flatten)]
    pub trade: Trade,
    #[serde(flatten)]
    pub pfe: BTreeMap<String, Option<f64>>,
}

impl TradePfeSnapshot {
    pub fn uncollateralized(&self, days: u32) -> Option<f64> {
        self.pfe.get(&format!("UncollatPFE_{}D", days)).copied().flatten()
    }

    pub fn collateralized(&self, days: u32) -> Option<f64> {
        self.pfe.get(&format!("CollatPFE_{}D", days)).copied().flatten()
    }
}

/// Snapshots for one page of `trades`, in trade order.
pub fn pfe_snapshots(
    trades: &[Trade],
    results: &[PfeResult],
    limit: usize,
    offset: usize,
) -> Vec<TradePfeSnapshot> {
    let page: Vec<&Trade> = trades.iter().skip(offset).take(limit).collect();

    let mut by_trade: HashMap<TransactionId, HashMap<u32, &PfeResult>> = HashMap::new();
    for result in results {
        if SNAPSHOT_HORIZONS.contains(&result.days) {
            by_trade
                .entry(result.transaction_id)
                .or_default()
                .insert(result.days, result);
        }
    }

    page.into_iter()
        .map(|trade| {
            let found = by_trade.get(&trade.transaction_id());
            let mut pfe = BTreeMap::new();
            for days in SNAPSHOT_HORIZONS {
                let result = found.and_then(|m| m.get(&days));
                pfe.insert(
                    format!("UncollatPFE_{}D", days),
                    result.map(|r| r.uncollateralized_pfe),
                );
                pfe.insert(
                    format!("CollatPFE_{}D", days),
                    result.map(|r| r.collateralized_pfe),
                );
            }
            TradePfeSnapshot {
                trade: trade.clone(),
                pfe,
            }
        })
        .collect()
}
