//! Synthetic FX forward trade populations.
//!
//! Generates seeded random trades over the major USD pairs, priced off a
//! rate history where one is available, for exercising the engine end to
//! end and for benchmarks.

use crate::core::counterparty::{CounterpartyId, TransactionId};
use crate::core::currency::CurrencyPair;
use crate::core::trade::{Leg, Trade, TradeSet};
use crate::market::rate_history::{RateHistory, MAJOR_PAIRS};
use chrono::{Days, NaiveDate};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;

/// Configuration for a generated trade population.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Number of trades to generate.
    pub trade_count: usize,
    /// Pairs a trade is struck in. The base currency is bought.
    pub pairs: Vec<CurrencyPair>,
    /// Size of the counterparty pool trades are drawn from.
    pub counterparty_count: usize,
    /// Trading dates fall in the year before, maturities in the year after.
    pub as_of: NaiveDate,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            trade_count: 1_000,
            pairs: MAJOR_PAIRS
                .iter()
                .filter_map(|label| label.parse().ok())
                .collect(),
            counterparty_count: 50,
            as_of: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            seed: 42,
        }
    }
}

/// Generate a random trade population.
///
/// The spot rate is the history's rate for the pair on the trading date,
/// or a uniform draw in `[1.0, 1.5)` when there is none.
pub fn generate_trades(config: &GeneratorConfig, history: Option<&RateHistory>) -> TradeSet {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut set = TradeSet::new();
    if config.pairs.is_empty() || config.counterparty_count == 0 {
        return set;
    }

    let counterparties = counterparty_pool(&mut rng, config.counterparty_count);
    let mut transaction_ids = BTreeSet::new();
    let mut fallback_spots = 0usize;

    while set.len() < config.trade_count {
        let transaction_id = rng.gen_range(10_000_000..100_000_000u64);
        if !transaction_ids.insert(transaction_id) {
            continue;
        }

        let pair = config.pairs[rng.gen_range(0..config.pairs.len())].clone();
        let quantity = f64::from(rng.gen_range(1..=10_000u32)) * 10_000.0;
        let trading_date = config.as_of - Days::new(rng.gen_range(0..=365));
        let maturity_date = config.as_of + Days::new(rng.gen_range(0..=365));

        let spot_rate = match history.and_then(|h| h.rate_on(&pair, trading_date)) {
            Some(rate) => rate,
            None => {
                fallback_spots += 1;
                round_dp(rng.gen_range(1.0..1.5), 4)
            }
        };
        let forward_rate = round_dp(spot_rate * rng.gen_range(0.99..1.01), 4);
        let collateral = round_dp(rng.gen_range(0.0..0.1) * quantity, 2);
        let counterparty = counterparties[rng.gen_range(0..counterparties.len())];

        set.add(
            Trade::new(
                TransactionId::new(transaction_id),
                counterparty,
                trading_date,
                maturity_date,
                Leg::new(pair.base.clone(), quantity),
                Leg::new(pair.quote.clone(), round_dp(quantity * spot_rate, 2)),
            )
            .with_rates(spot_rate, forward_rate)
            .with_collateral_factor(collateral),
        );
    }

    debug!(
        "generated {} trades over {} counterparties, {} with fallback spot",
        set.len(),
        counterparties.len(),
        fallback_spots
    );
    set
}

/// Distinct five-digit counterparty ids.
fn counterparty_pool(rng: &mut StdRng, count: usize) -> Vec<CounterpartyId> {
    let mut ids = BTreeSet::new();
    while ids.len() < count.min(90_000) {
        ids.insert(rng.gen_range(10_000..100_000u64));
    }
    ids.into_iter().map(CounterpartyId::new).collect()
}

fn round_dp(value: f64, dp: i32) -> f64 {
    let scale = 10f64.powi(dp);
    (value * scale).round() / scale
}
