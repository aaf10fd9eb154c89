use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of the counterparty facing a trade.
///
/// # Examples
///
/// ```
/// use fx_pfe_engine::core::counterparty::CounterpartyId;
///
/// let a = CounterpartyId::new(10_442);
/// let b = CounterpartyId::new(73_105);
/// assert_ne!(a, b);
/// assert_eq!(a.to_string(), "10442");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterpartyId(u64);

impl CounterpartyId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CounterpartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CounterpartyId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl FromStr for CounterpartyId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Identifier of a single FX forward transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(u64);

impl TransactionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TransactionId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl FromStr for TransactionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counterparty_equality() {
        let a = CounterpartyId::new(12345);
        let b = CounterpartyId::from(12345);
        let c = CounterpartyId::new(54321);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_counterparty_ordering() {
        assert!(CounterpartyId::new(1) < CounterpartyId::new(2));
    }

    #[test]
    fn test_parse_identifiers() {
        assert_eq!("  42 ".parse::<CounterpartyId>(), Ok(CounterpartyId::new(42)));
        assert_eq!(
            "87654321".parse::<TransactionId>(),
            Ok(TransactionId::new(87_654_321))
        );
        assert!("abc".parse::<TransactionId>().is_err());
    }

    #[test]
    fn test_transaction_serde_transparent() {
        let id = TransactionId::new(99);
        assert_eq!(serde_json::to_string(&id).unwrap(), "99");
    }
}
