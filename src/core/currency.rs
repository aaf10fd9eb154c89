use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// ISO 4217-style currency code.
///
/// # Examples
///
/// ```
/// use fx_pfe_engine::core::currency::CurrencyCode;
///
/// let eur = CurrencyCode::new("EUR");
/// let usd = CurrencyCode::new("USD");
/// assert_ne!(eur, usd);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Errors arising from currency pair labels.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("currency pair label must look like BASE/QUOTE, got '{0}'")]
    MalformedPair(String),
}

/// A pair of currencies quoted as `BASE/QUOTE`.
///
/// Pairs label the columns of the rate history and the entries of a
/// [`MarketBasis`](crate::market::basis::MarketBasis).
///
/// # Examples
///
/// ```
/// use fx_pfe_engine::core::currency::CurrencyPair;
///
/// let pair: CurrencyPair = "EUR/USD".parse().unwrap();
/// assert_eq!(pair.base.as_str(), "EUR");
/// assert_eq!(pair.quote.as_str(), "USD");
/// assert_eq!(pair.to_string(), "EUR/USD");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencyPair {
    pub base: CurrencyCode,
    pub quote: CurrencyCode,
}

impl CurrencyPair {
    pub fn new(base: impl Into<CurrencyCode>, quote: impl Into<CurrencyCode>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for CurrencyPair {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, quote) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| CurrencyError::MalformedPair(s.to_string()))?;
        let (base, quote) = (base.trim(), quote.trim());
        if base.is_empty() || quote.is_empty() || quote.contains('/') {
            return Err(CurrencyError::MalformedPair(s.to_string()));
        }
        Ok(Self::new(base, quote))
    }
}

impl Serialize for CurrencyPair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CurrencyPair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}
