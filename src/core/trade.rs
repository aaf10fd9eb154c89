use crate::core::counterparty::{CounterpartyId, TransactionId};
use crate::core::currency::{CurrencyCode, CurrencyPair};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a trade record violates the trade invariants.
#[derive(Debug, Error, PartialEq)]
pub enum TradeError {
    #[error("trade {id}: collateral factor must be non-negative, got {value}")]
    NegativeCollateral { id: TransactionId, value: f64 },
    #[error("trade {id}: {leg} notional must be finite and non-negative, got {value}")]
    InvalidNotional {
        id: TransactionId,
        leg: &'static str,
        value: f64,
    },
}

/// One side of an FX forward: the currency exchanged and its notional.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    pub currency: CurrencyCode,
    pub notional: f64,
}

impl Leg {
    pub fn new(currency: impl Into<CurrencyCode>, notional: f64) -> Self {
        Self {
            currency: currency.into(),
            notional,
        }
    }
}

/// An FX forward trade.
///
/// Trades are created once by upstream sourcing and never mutated by the
/// engine. The serialized form uses the record field names of the trade
/// tables (`TransactionID`, `BuyNotional`, ...).
///
/// # Examples
///
/// ```
/// use fx_pfe_engine::core::counterparty::{CounterpartyId, TransactionId};
/// use fx_pfe_engine::core::trade::{Leg, Trade};
/// use chrono::NaiveDate;
///
/// let trade = Trade::new(
///     TransactionId::new(10_000_001),
///     CounterpartyId::new(48_213),
///     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
///     Leg::new("EUR", 1_000_000.0),
///     Leg::new("USD", 1_100_000.0),
/// )
/// .with_collateral_factor(25_000.0);
///
/// assert_eq!(trade.currency_pair().to_string(), "EUR/USD");
/// assert_eq!(trade.time_to_maturity_days(), 184);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TradeRecord", into = "TradeRecord")]
pub struct Trade {
    transaction_id: TransactionId,
    counterparty_id: CounterpartyId,
    trading_date: NaiveDate,
    maturity_date: NaiveDate,
    buy: Leg,
    sell: Leg,
    spot_rate: f64,
    forward_rate: f64,
    /// Scalar collateral offset subtracted from PFE. Never negative.
    collateral_factor: f64,
}

impl Trade {
    /// Create a new trade with no collateral and unit rates.
    ///
    /// # Panics
    ///
    /// Panics if either notional is negative or not finite.
    pub fn new(
        transaction_id: TransactionId,
        counterparty_id: CounterpartyId,
        trading_date: NaiveDate,
        maturity_date: NaiveDate,
        buy: Leg,
        sell: Leg,
    ) -> Self {
        assert!(
            valid_notional(buy.notional) && valid_notional(sell.notional),
            "Trade notionals must be finite and non-negative, got {} / {}",
            buy.notional,
            sell.notional
        );
        Self {
            transaction_id,
            counterparty_id,
            trading_date,
            maturity_date,
            buy,
            sell,
            spot_rate: 1.0,
            forward_rate: 1.0,
            collateral_factor: 0.0,
        }
    }

    /// Set the spot and forward rates captured at execution.
    pub fn with_rates(mut self, spot_rate: f64, forward_rate: f64) -> Self {
        self.spot_rate = spot_rate;
        self.forward_rate = forward_rate;
        self
    }

    /// Set the collateral factor.
    ///
    /// # Panics
    ///
    /// Panics if `collateral_factor` is negative or NaN.
    pub fn with_collateral_factor(mut self, collateral_factor: f64) -> Self {
        assert!(
            collateral_factor >= 0.0,
            "Collateral factor must be non-negative, got {}",
            collateral_factor
        );
        self.collateral_factor = collateral_factor;
        self
    }

    // --- Accessors ---

    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    pub fn counterparty_id(&self) -> CounterpartyId {
        self.counterparty_id
    }

    pub fn trading_date(&self) -> NaiveDate {
        self.trading_date
    }

    pub fn maturity_date(&self) -> NaiveDate {
        self.maturity_date
    }

    pub fn buy_currency(&self) -> &CurrencyCode {
        &self.buy.currency
    }

    pub fn sell_currency(&self) -> &CurrencyCode {
        &self.sell.currency
    }

    pub fn buy_notional(&self) -> f64 {
        self.buy.notional
    }

    pub fn sell_notional(&self) -> f64 {
        self.sell.notional
    }

    pub fn spot_rate(&self) -> f64 {
        self.spot_rate
    }

    pub fn forward_rate(&self) -> f64 {
        self.forward_rate
    }

    pub fn collateral_factor(&self) -> f64 {
        self.collateral_factor
    }

    /// The `BUY/SELL` label used when grouping exposures.
    pub fn currency_pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.buy.currency.clone(), self.sell.currency.clone())
    }

    /// Calendar days from trading date to maturity date. May be negative
    /// for malformed records.
    pub fn time_to_maturity_days(&self) -> i64 {
        (self.maturity_date - self.trading_date).num_days()
    }
}

fn valid_notional(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Wire form of a trade, matching the trade table columns.
#[derive(Serialize, Deserialize)]
struct TradeRecord {
    #[serde(rename = "TransactionID")]
    transaction_id: TransactionId,
    #[serde(rename = "TradingDate")]
    trading_date: NaiveDate,
    #[serde(rename = "MaturityDate")]
    maturity_date: NaiveDate,
    #[serde(rename = "BuyCurrency")]
    buy_currency: CurrencyCode,
    #[serde(rename = "SellCurrency")]
    sell_currency: CurrencyCode,
    #[serde(rename = "SpotRate")]
    spot_rate: f64,
    #[serde(rename = "ForwardRate")]
    forward_rate: f64,
    #[serde(rename = "BuyNotional")]
    buy_notional: f64,
    #[serde(rename = "SellNotional")]
    sell_notional: f64,
    #[serde(rename = "CounterpartyID")]
    counterparty_id: CounterpartyId,
    #[serde(rename = "CollateralFactor", default)]
    collateral_factor: f64,
}

impl TryFrom<TradeRecord> for Trade {
    type Error = TradeError;

    fn try_from(record: TradeRecord) -> Result<Self, Self::Error> {
        let id = record.transaction_id;
        for (leg, value) in [("buy", record.buy_notional), ("sell", record.sell_notional)] {
            if !valid_notional(value) {
                return Err(TradeError::InvalidNotional { id, leg, value });
            }
        }
        if record.collateral_factor.is_nan() || record.collateral_factor < 0.0 {
            return Err(TradeError::NegativeCollateral {
                id,
                value: record.collateral_factor,
            });
        }
        Ok(Self {
            transaction_id: id,
            counterparty_id: record.counterparty_id,
            trading_date: record.trading_date,
            maturity_date: record.maturity_date,
            buy: Leg::new(record.buy_currency, record.buy_notional),
            sell: Leg::new(record.sell_currency, record.sell_notional),
            spot_rate: record.spot_rate,
            forward_rate: record.forward_rate,
            collateral_factor: record.collateral_factor,
        })
    }
}

impl From<Trade> for TradeRecord {
    fn from(trade: Trade) -> Self {
        Self {
            transaction_id: trade.transaction_id,
            trading_date: trade.trading_date,
            maturity_date: trade.maturity_date,
            buy_currency: trade.buy.currency,
            sell_currency: trade.sell.currency,
            spot_rate: trade.spot_rate,
            forward_rate: trade.forward_rate,
            buy_notional: trade.buy.notional,
            sell_notional: trade.sell.notional,
            counterparty_id: trade.counterparty_id,
            collateral_factor: trade.collateral_factor,
        }
    }
}

/// An ordered population of trades submitted to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeSet {
    trades: Vec<Trade>,
}

impl TradeSet {
    pub fn new() -> Self {
        Self { trades: Vec::new() }
    }

    pub fn add(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn get(&self, id: TransactionId) -> Option<&Trade> {
        self.trades.iter().find(|t| t.transaction_id() == id)
    }

    /// All unique counterparties, ascending.
    pub fn counterparties(&self) -> Vec<CounterpartyId> {
        let mut counterparties: Vec<CounterpartyId> =
            self.trades.iter().map(|t| t.counterparty_id()).collect();
        counterparties.sort();
        counterparties.dedup();
        counterparties
    }

    /// All unique `BUY/SELL` pairs, ascending.
    pub fn currency_pairs(&self) -> Vec<CurrencyPair> {
        let mut pairs: Vec<CurrencyPair> = self.trades.iter().map(|t| t.currency_pair()).collect();
        pairs.sort();
        pairs.dedup();
        pairs
    }
}

impl FromIterator<Trade> for TradeSet {
    fn from_iter<T: IntoIterator<Item = Trade>>(iter: T) -> Self {
        Self {
            trades: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for TradeSet {
    type Item = Trade;
    type IntoIter = std::vec::IntoIter<Trade>;

    fn into_iter(self) -> Self::IntoIter {
        self.trades.into_iter()
    }
}
