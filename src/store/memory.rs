use super::{PfeStore, StoreError};
use crate::core::trade::Trade;
use crate::exposure::batch::PfeResult;
use crate::exposure::policy::Engine;
use std::collections::HashMap;

/// In-process store, mainly for tests and one-shot runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    trades: HashMap<Engine, Vec<Trade>>,
    results: HashMap<Engine, Vec<PfeResult>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PfeStore for MemoryStore {
    fn replace_trades(&mut self, engine: Engine, trades: &[Trade]) -> Result<(), StoreError> {
        self.trades.insert(engine, trades.to_vec());
        Ok(())
    }

    fn replace_results(
        &mut self,
        engine: Engine,
        results: &[PfeResult],
    ) -> Result<(), StoreError> {
        self.results.insert(engine, results.to_vec());
        Ok(())
    }

    fn trades(&self, engine: Engine) -> Result<Vec<Trade>, StoreError> {
        Ok(self.trades.get(&engine).cloned().unwrap_or_default())
    }

    fn results(&self, engine: Engine) -> Result<Vec<PfeResult>, StoreError> {
        Ok(self.results.get(&engine).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::counterparty::{CounterpartyId, TransactionId};
    use crate::core::trade::Leg;
    use chrono::NaiveDate;

    fn trade(id: u64) -> Trade {
        Trade::new(
            TransactionId::new(id),
            CounterpartyId::new(50_001),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
            Leg::new("GBP", 10.0),
            Leg::new("USD", 12.5),
        )
    }

    #[test]
    fn test_replace_is_wholesale_and_per_engine() {
        let mut store = MemoryStore::new();
        store.replace_trades(Engine::F22, &[trade(1), trade(2)]).unwrap();
        store.replace_trades(Engine::F22, &[trade(3)]).unwrap();
        store.replace_trades(Engine::Quic, &[trade(4)]).unwrap();

        let f22 = store.trades(Engine::F22).unwrap();
        assert_eq!(f22.len(), 1);
        assert_eq!(f22[0].transaction_id(), TransactionId::new(3));
        assert_eq!(store.trades(Engine::Quic).unwrap().len(), 1);
    }
}
