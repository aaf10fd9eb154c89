use crate::core::currency::CurrencyPair;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// The ordered set of currency pairs a volatility snapshot is expressed in.
///
/// A basis fixes the dimension and index order of every exposure vector
/// and covariance matrix derived from the same snapshot. It is immutable
/// and cheap to clone, so vectors and matrices carry it alongside their
/// values instead of relying on positional convention.
///
/// # Examples
///
/// ```
/// use fx_pfe_engine::core::currency::CurrencyPair;
/// use fx_pfe_engine::market::basis::MarketBasis;
///
/// let basis = MarketBasis::new(vec![
///     CurrencyPair::new("EUR", "USD"),
///     CurrencyPair::new("USD", "JPY"),
/// ]);
/// assert_eq!(basis.len(), 2);
/// assert_eq!(basis.index_of(&CurrencyPair::new("USD", "JPY")), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MarketBasis {
    pairs: Arc<[CurrencyPair]>,
}

impl MarketBasis {
    /// Build a basis. Repeated pairs keep their first position only.
    pub fn new(pairs: impl IntoIterator<Item = CurrencyPair>) -> Self {
        let mut unique: Vec<CurrencyPair> = Vec::new();
        for pair in pairs {
            if !unique.contains(&pair) {
                unique.push(pair);
            }
        }
        Self {
            pairs: unique.into(),
        }
    }

    pub fn pairs(&self) -> &[CurrencyPair] {
        &self.pairs
    }

    pub fn iter(&self) -> impl Iterator<Item = &CurrencyPair> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn index_of(&self, pair: &CurrencyPair) -> Option<usize> {
        self.pairs.iter().position(|p| p == pair)
    }

    /// Whether `other` is the same snapshot, or an identical one.
    pub fn is_aligned_with(&self, other: &MarketBasis) -> bool {
        Arc::ptr_eq(&self.pairs, &other.pairs) || self == other
    }
}

impl fmt::Display for MarketBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.pairs.iter().map(|p| p.to_string()).collect();
        write!(f, "[{}]", labels.join(", "))
    }
}

impl Serialize for MarketBasis {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.pairs.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_keeps_order_and_drops_repeats() {
        let basis = MarketBasis::new(vec![
            CurrencyPair::new("GBP", "USD"),
            CurrencyPair::new("EUR", "USD"),
            CurrencyPair::new("GBP", "USD"),
        ]);
        assert_eq!(
            basis.pairs(),
            &[CurrencyPair::new("GBP", "USD"), CurrencyPair::new("EUR", "USD")]
        );
    }

    #[test]
    fn test_alignment() {
        let a = MarketBasis::new(vec![CurrencyPair::new("EUR", "USD")]);
        let b = a.clone();
        let c = MarketBasis::new(vec![CurrencyPair::new("EUR", "USD")]);
        let d = MarketBasis::new(vec![CurrencyPair::new("USD", "JPY")]);
        assert!(a.is_aligned_with(&b));
        assert!(a.is_aligned_with(&c));
        assert!(!a.is_aligned_with(&d));
    }

    #[test]
    fn test_display_and_serialize() {
        let basis = MarketBasis::new(vec![
            CurrencyPair::new("EUR", "USD"),
            CurrencyPair::new("AUD", "USD"),
        ]);
        assert_eq!(basis.to_string(), "[EUR/USD, AUD/USD]");
        assert_eq!(
            serde_json::to_string(&basis).unwrap(),
            r#"["EUR/USD","AUD/USD"]"#
        );
    }
}
