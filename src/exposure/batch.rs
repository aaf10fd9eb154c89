//! Batch evaluation of a trade population over a grid of horizons.

use crate::core::counterparty::{CounterpartyId, TransactionId};
use crate::core::currency::CurrencyCode;
use crate::core::trade::Trade;
use crate::exposure::pfe::PfeCalculator;
use crate::market::risk_model::RiskModel;
use chrono::NaiveDate;
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Default number of daily horizons evaluated per trade.
pub const DEFAULT_MAX_HORIZON_DAYS: u32 = 30;

/// A contiguous run of horizons `1..=max_days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HorizonGrid {
    max_days: u32,
}

impl HorizonGrid {
    pub fn up_to(max_days: u32) -> Self {
        Self { max_days }
    }

    pub fn max_days(&self) -> u32 {
        self.max_days
    }

    pub fn days(&self) -> impl Iterator<Item = u32> {
        1..=self.max_days
    }

    pub fn len(&self) -> usize {
        self.max_days as usize
    }

    pub fn is_empty(&self) -> bool {
        self.max_days == 0
    }
}

impl Default for HorizonGrid {
    fn default() -> Self {
        Self::up_to(DEFAULT_MAX_HORIZON_DAYS)
    }
}

/// PFE of one trade at one horizon, in the stored result layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PfeResult {
    #[serde(rename = "TransactionID")]
    pub transaction_id: TransactionId,
    #[serde(rename = "CounterpartyID")]
    pub counterparty_id: CounterpartyId,
    #[serde(rename = "BuyCurrency")]
    pub buy_currency: CurrencyCode,
    #[serde(rename = "SellCurrency")]
    pub sell_currency: CurrencyCode,
    #[serde(rename = "MaturityDate")]
    pub maturity_date: NaiveDate,
    #[serde(rename = "Days")]
    pub days: u32,
    #[serde(rename = "Uncollateralized_PFE")]
    pub uncollateralized_pfe: f64,
    #[serde(rename = "Collateralized_PFE")]
    pub collateralized_pfe: f64,
}

/// Runs one calculator over every trade and every horizon of a grid
/// against a shared, read-only [`RiskModel`].
///
/// Output is trade-major and horizon-minor in input order, whatever the
/// number of worker threads.
pub struct BatchRunner<'a> {
    model: &'a RiskModel,
    calculator: PfeCalculator,
    grid: HorizonGrid,
}

impl<'a> BatchRunner<'a> {
    pub fn new(model: &'a RiskModel, calculator: PfeCalculator, grid: HorizonGrid) -> Self {
        Self {
            model,
            calculator,
            grid,
        }
    }

    pub fn grid(&self) -> HorizonGrid {
        self.grid
    }

    /// All horizons for one trade. The exposure is built once.
    pub fn results_for_trade(&self, trade: &Trade) -> Vec<PfeResult> {
        self.evaluate(trade).1
    }

    /// Rows for one trade, flagged when its exposure is all zeros.
    fn evaluate(&self, trade: &Trade) -> (bool, Vec<PfeResult>) {
        let exposure = self.model.exposure(trade);
        let covariance = self.model.covariance();
        let rows = self
            .grid
            .days()
            .map(|days| {
                let outcome =
                    self.calculator
                        .calculate(&exposure, days, covariance, trade.collateral_factor());
                PfeResult {
                    transaction_id: trade.transaction_id(),
                    counterparty_id: trade.counterparty_id(),
                    buy_currency: trade.buy_currency().clone(),
                    sell_currency: trade.sell_currency().clone(),
                    maturity_date: trade.maturity_date(),
                    days,
                    uncollateralized_pfe: outcome.uncollateralized,
                    collateralized_pfe: outcome.collateralized,
                }
            })
            .collect();
        (exposure.is_zero(), rows)
    }

    pub fn run(&self, trades: &[Trade]) -> Vec<PfeResult> {
        let per_trade: Vec<(bool, Vec<PfeResult>)> = trades
            .par_iter()
            .map(|trade| self.evaluate(trade))
            .collect();

        let unmapped = per_trade.iter().filter(|(zero, _)| *zero).count();
        let results: Vec<PfeResult> = per_trade.into_iter().flat_map(|(_, rows)| rows).collect();
        info!(
            "evaluated {} trades over {} horizons: {} results, {} trades with zero exposure",
            trades.len(),
            self.grid.len(),
            results.len(),
            unmapped
        );
        results
    }
}
