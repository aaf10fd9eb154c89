use crate::core::currency::{CurrencyCode, CurrencyPair};
use crate::core::trade::Trade;
use crate::market::basis::MarketBasis;
use nalgebra::DVector;

/// A trade's signed notional exposure projected onto a [`MarketBasis`].
///
/// # Decomposition rule
///
/// For every basis pair `(base, quote)` the first matching rule applies:
///
/// | condition                     | contribution   |
/// |-------------------------------|----------------|
/// | buy = base and sell = quote   | `+buy`         |
/// | sell = base and buy = quote   | `-sell`        |
/// | buy = base                    | `+buy`         |
/// | sell = base                   | `-sell`        |
/// | buy = quote                   | `-buy`         |
/// | sell = quote                  | `+sell`        |
/// | otherwise                     | `0`            |
///
/// A trade therefore loads every basis pair sharing one of its currencies,
/// not only the exact pair it was struck in. Stored reference results
/// depend on this, so it is kept as is.
///
/// # Examples
///
/// ```
/// use fx_pfe_engine::core::currency::{CurrencyCode, CurrencyPair};
/// use fx_pfe_engine::exposure::vector::ExposureVector;
/// use fx_pfe_engine::market::basis::MarketBasis;
///
/// let basis = MarketBasis::new(vec![
///     CurrencyPair::new("EUR", "USD"),
///     CurrencyPair::new("USD", "JPY"),
/// ]);
/// let exposure = ExposureVector::build(
///     &basis,
///     &CurrencyCode::new("EUR"),
///     &CurrencyCode::new("USD"),
///     1_000_000.0,
///     1_100_000.0,
/// );
/// // exact pair, then the USD leg loads USD/JPY as a base-currency sale
/// assert_eq!(exposure.as_slice(), &[1_000_000.0, -1_100_000.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureVector {
    basis: MarketBasis,
    values: DVector<f64>,
}

impl ExposureVector {
    /// Project a buy/sell leg pair onto `basis`.
    pub fn build(
        basis: &MarketBasis,
        buy_currency: &CurrencyCode,
        sell_currency: &CurrencyCode,
        buy_notional: f64,
        sell_notional: f64,
    ) -> Self {
        let values = basis
            .iter()
            .map(|pair| contribution(pair, buy_currency, sell_currency, buy_notional, sell_notional));
        Self {
            basis: basis.clone(),
            values: DVector::from_iterator(basis.len(), values),
        }
    }

    pub fn for_trade(basis: &MarketBasis, trade: &Trade) -> Self {
        Self::build(
            basis,
            trade.buy_currency(),
            trade.sell_currency(),
            trade.buy_notional(),
            trade.sell_notional(),
        )
    }

    /// Wrap explicit values already ordered by `basis`.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not have one entry per basis pair.
    pub fn from_values(basis: &MarketBasis, values: Vec<f64>) -> Self {
        assert_eq!(
            values.len(),
            basis.len(),
            "Exposure vector needs one value per basis pair"
        );
        Self {
            basis: basis.clone(),
            values: DVector::from_vec(values),
        }
    }

    pub fn zeros(basis: &MarketBasis) -> Self {
        Self {
            basis: basis.clone(),
            values: DVector::zeros(basis.len()),
        }
    }

    pub fn basis(&self) -> &MarketBasis {
        &self.basis
    }

    pub fn values(&self) -> &DVector<f64> {
        &self.values
    }

    pub fn as_slice(&self) -> &[f64] {
        self.values.as_slice()
    }

    pub fn get(&self, pair: &CurrencyPair) -> Option<f64> {
        self.basis.index_of(pair).map(|i| self.values[i])
    }

    /// True when no basis pair receives a contribution.
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }
}

fn contribution(
    pair: &CurrencyPair,
    buy: &CurrencyCode,
    sell: &CurrencyCode,
    buy_notional: f64,
    sell_notional: f64,
) -> f64 {
    let (base, quote) = (&pair.base, &pair.quote);
    if buy == base && sell == quote {
        buy_notional
    } else if sell == base && buy == quote {
        -sell_notional
    } else if buy == base {
        buy_notional
    } else if sell == base {
        -sell_notional
    } else if buy == quote {
        -buy_notional
    } else if sell == quote {
        sell_notional
    } else {
        0.0
    }
}
