use crate::core::counterparty::{CounterpartyId, TransactionId};
use crate::core::trade::Trade;
use crate::exposure::batch::PfeResult;
use crate::exposure::policy::Engine;
use crate::store::{PfeStore, StoreError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    /// The scope matched no stored rows. Not a storage failure.
    #[error("no data found for the given parameters")]
    EmptyQueryScope,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A PFE result joined with its trade's trading date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PfeRecord {
    #[serde(flatten)]
    pub result: PfeResult,
    #[serde(rename = "TradingDate")]
    pub trading_date: NaiveDate,
}

impl PfeRecord {
    /// Calendar days from trading date to maturity.
    pub fn time_to_maturity_days(&self) -> i64 {
        (self.result.maturity_date - self.trading_date).num_days()
    }

    /// `BUY/SELL` label.
    pub fn currency_pair_label(&self) -> String {
        format!("{}/{}", self.result.buy_currency, self.result.sell_currency)
    }
}

/// Inner join of results to trades on transaction id, in result order.
pub fn join(trades: &[Trade], results: &[PfeResult]) -> Vec<PfeRecord> {
    let trading_dates: HashMap<TransactionId, NaiveDate> = trades
        .iter()
        .map(|t| (t.transaction_id(), t.trading_date()))
        .collect();
    results
        .iter()
        .filter_map(|result| {
            trading_dates
                .get(&result.transaction_id)
                .map(|&trading_date| PfeRecord {
                    result: result.clone(),
                    trading_date,
                })
        })
        .collect()
}

/// Which stored rows an analytics request covers.
///
/// Filters are independent: a transaction filter applies with or without
/// a counterparty filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PfeQuery {
    pub engine: Engine,
    #[serde(default)]
    pub counterparty_id: Option<CounterpartyId>,
    #[serde(default)]
    pub transaction_id: Option<TransactionId>,
}

impl PfeQuery {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            counterparty_id: None,
            transaction_id: None,
        }
    }

    pub fn with_counterparty(mut self, id: CounterpartyId) -> Self {
        self.counterparty_id = Some(id);
        self
    }

    pub fn with_transaction(mut self, id: TransactionId) -> Self {
        self.transaction_id = Some(id);
        self
    }

    pub fn matches(&self, counterparty: CounterpartyId, transaction: TransactionId) -> bool {
        self.counterparty_id.map_or(true, |id| id == counterparty)
            && self.transaction_id.map_or(true, |id| id == transaction)
    }

    /// The engine's stored trades that fall in scope.
    pub fn trades<S: PfeStore + ?Sized>(&self, store: &S) -> Result<Vec<Trade>, QueryError> {
        let trades: Vec<Trade> = store
            .trades(self.engine)?
            .into_iter()
            .filter(|t| self.matches(t.counterparty_id(), t.transaction_id()))
            .collect();
        if trades.is_empty() {
            return Err(QueryError::EmptyQueryScope);
        }
        Ok(trades)
    }

    /// Joined records in scope, in stored result order.
    pub fn resolve<S: PfeStore + ?Sized>(&self, store: &S) -> Result<Vec<PfeRecord>, QueryError> {
        let trades = store.trades(self.engine)?;
        let results = store.results(self.engine)?;
        let records: Vec<PfeRecord> = join(&trades, &results)
            .into_iter()
            .filter(|r| self.matches(r.result.counterparty_id, r.result.transaction_id))
            .collect();
        if records.is_empty() {
            return Err(QueryError::EmptyQueryScope);
        }
        Ok(records)
    }
}
