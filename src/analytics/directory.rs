use crate::core::counterparty::{CounterpartyId, TransactionId};
use crate::core::trade::Trade;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionEntry {
    pub id: TransactionId,
    pub name: String,
}

/// A counterparty and the transactions booked against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterpartyEntry {
    pub id: CounterpartyId,
    pub name: String,
    pub transactions: Vec<TransactionEntry>,
}

/// Every counterparty in `trades`, ascending by id. Transactions keep
/// trade order.
pub fn counterparty_directory(trades: &[Trade]) -> Vec<CounterpartyEntry> {
    let mut grouped: BTreeMap<CounterpartyId, Vec<TransactionEntry>> = BTreeMap::new();
    for trade in trades {
        let id = trade.transaction_id();
        grouped
            .entry(trade.counterparty_id())
            .or_default()
            .push(TransactionEntry {
                id,
                name: format!("Transaction {}", id),
            });
    }
    grouped
        .into_iter()
        .map(|(id, transactions)| CounterpartyEntry {
            id,
            name: format!("Counterparty {}", id),
            transactions,
        })
        .collect()
}
