//! Volatility and correlation estimation from historical spot rates.
//!
//! Daily percentage returns are computed on a forward-filled rate table,
//! rows where any basis pair lacks a return are dropped so every pair is
//! measured over the same window, and the sample statistics are annualized
//! on a 252 trading-day year.

use crate::market::basis::MarketBasis;
use crate::market::rate_history::{MarketDataError, RateHistory};
use crate::market::risk_model::RiskModel;
use log::{debug, info, warn};
use nalgebra::DMatrix;

/// Trading days per year used to annualize daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Aligned period-over-period returns, one column per basis pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    basis: MarketBasis,
    /// rows = observations, columns = basis pairs
    returns: DMatrix<f64>,
}

impl ReturnSeries {
    pub fn basis(&self) -> &MarketBasis {
        &self.basis
    }

    pub fn returns(&self) -> &DMatrix<f64> {
        &self.returns
    }

    pub fn observations(&self) -> usize {
        self.returns.nrows()
    }

    /// Sample standard deviation (n - 1) of each column.
    pub fn sample_std(&self) -> Vec<f64> {
        self.returns
            .column_iter()
            .map(|col| sample_std(&col.iter().copied().collect::<Vec<f64>>()))
            .collect()
    }

    /// Pearson correlation of every pair of columns. A constant column is
    /// uncorrelated with the others.
    pub fn correlation(&self) -> DMatrix<f64> {
        let n = self.basis.len();
        let columns: Vec<Vec<f64>> = self
            .returns
            .column_iter()
            .map(|c| c.iter().copied().collect())
            .collect();
        let mut corr = DMatrix::identity(n, n);
        for i in 0..n {
            for j in (i + 1)..n {
                let rho = pearson(&columns[i], &columns[j]);
                corr[(i, j)] = rho;
                corr[(j, i)] = rho;
            }
        }
        corr
    }
}

/// Builds a [`RiskModel`] from a [`RateHistory`].
pub struct VolatilityBuilder;

impl VolatilityBuilder {
    /// Compute aligned daily returns for every pair with market data.
    ///
    /// Pairs with no valid observation are left out of the basis.
    pub fn returns(history: &RateHistory) -> Result<ReturnSeries, MarketDataError> {
        let observed = history.observed_pairs();
        for pair in history.pairs() {
            if !observed.contains(pair) {
                warn!("{} has no valid observations, excluded from basis", pair);
            }
        }
        if observed.is_empty() {
            return Err(MarketDataError::EmptyBasis);
        }

        let filled: Vec<Vec<Option<f64>>> = observed
            .iter()
            .filter_map(|pair| history.series(pair))
            .map(|series| forward_fill(&series))
            .collect();

        let mut rows: Vec<f64> = Vec::new();
        let mut observations = 0;
        for t in 1..history.len() {
            let row: Option<Vec<f64>> = filled
                .iter()
                .map(|series| match (series[t - 1], series[t]) {
                    (Some(prev), Some(cur)) => Some(cur / prev - 1.0),
                    _ => None,
                })
                .collect();
            if let Some(row) = row {
                rows.extend(row);
                observations += 1;
            }
        }
        debug!(
            "{} aligned return rows from {} dated rows over {} pairs",
            observations,
            history.len(),
            observed.len()
        );

        Ok(ReturnSeries {
            basis: MarketBasis::new(observed),
            returns: DMatrix::from_row_slice(observations, filled.len(), &rows),
        })
    }

    /// Estimate annualized volatilities and correlations and derive the
    /// covariance matrix.
    pub fn build(history: &RateHistory) -> Result<RiskModel, MarketDataError> {
        let series = Self::returns(history)?;
        if series.observations() < 2 {
            return Err(MarketDataError::InsufficientHistory {
                observations: series.observations(),
            });
        }

        let annualizer = TRADING_DAYS_PER_YEAR.sqrt();
        let volatilities: Vec<f64> = series
            .sample_std()
            .into_iter()
            .map(|sd| sd * annualizer)
            .collect();
        for (pair, vol) in series.basis().iter().zip(&volatilities) {
            debug!("{} annualized volatility {:.6}", pair, vol);
        }

        let model = RiskModel::new(series.basis().clone(), volatilities, series.correlation())?;
        info!(
            "risk model built over {} pairs from {} return observations",
            model.basis().len(),
            series.observations()
        );
        Ok(model)
    }
}

fn forward_fill(series: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = None;
    series
        .iter()
        .map(|value| {
            if value.is_some() {
                last = *value;
            }
            last
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let (mx, my) = (mean(x), mean(y));
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return 0.0;
    }
    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::CurrencyPair;
    use crate::market::risk_model::VOLATILITY_FLOOR;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn history(columns: &[(&str, &[f64])]) -> RateHistory {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let mut history = RateHistory::new();
        for (label, rates) in columns {
            let pair: CurrencyPair = label.parse().unwrap();
            for (i, rate) in rates.iter().enumerate() {
                history.insert(start + chrono::Days::new(i as u64), &pair, *rate);
            }
        }
        history
    }

    #[test]
    fn test_returns_drop_first_row() {
        let h = history(&[("EUR/USD", &[1.0, 1.1, 0.99])]);
        let series = VolatilityBuilder::returns(&h).unwrap();
        assert_eq!(series.observations(), 2);
        assert_relative_eq!(series.returns()[(0, 0)], 0.1, epsilon = 1e-12);
        assert_relative_eq!(series.returns()[(1, 0)], -0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_annualized_sample_volatility() {
        // returns +10% and -10%: mean 0, sample sd = sqrt(0.02 / 1)
        let h = history(&[("EUR/USD", &[1.0, 1.1, 0.99])]);
        let model = VolatilityBuilder::build(&h).unwrap();
        let expected = 0.02_f64.sqrt() * 252.0_f64.sqrt();
        assert_relative_eq!(
            model.volatilities().values()[0],
            expected,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_constant_series_gets_floor_and_zero_correlation() {
        let h = history(&[
            ("EUR/USD", &[1.0, 1.1, 0.99, 1.05]),
            ("USD/CHF", &[0.9, 0.9, 0.9, 0.9]),
        ]);
        let model = VolatilityBuilder::build(&h).unwrap();
        let chf = CurrencyPair::new("USD", "CHF");
        let eur = CurrencyPair::new("EUR", "USD");
        assert_eq!(model.volatilities().get(&chf), Some(VOLATILITY_FLOOR));
        assert_eq!(model.correlation().get(&eur, &chf), Some(0.0));
        assert_eq!(model.correlation().get(&chf, &chf), Some(1.0));
    }

    #[test]
    fn test_perfectly_correlated_pairs() {
        let h = history(&[
            ("EUR/USD", &[1.00, 1.02, 1.01, 1.03]),
            ("GBP/USD", &[2.00, 2.04, 2.02, 2.06]),
        ]);
        let model = VolatilityBuilder::build(&h).unwrap();
        let rho = model
            .correlation()
            .get(&CurrencyPair::new("EUR", "USD"), &CurrencyPair::new("GBP", "USD"))
            .unwrap();
        assert_relative_eq!(rho, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_pair_excluded_from_basis() {
        let h = history(&[
            ("EUR/USD", &[1.0, 1.1, 0.99]),
            ("NZD/USD", &[0.0, f64::NAN, 0.0]),
        ]);
        let model = VolatilityBuilder::build(&h).unwrap();
        assert_eq!(model.basis().pairs(), &[CurrencyPair::new("EUR", "USD")]);
    }

    #[test]
    fn test_invalid_rate_is_forward_filled_not_zero() {
        // the 0.0 on day 3 is missing: day 4 return is measured against day 2
        let h = history(&[("USD/JPY", &[100.0, 110.0, 0.0, 121.0])]);
        let series = VolatilityBuilder::returns(&h).unwrap();
        let returns: Vec<f64> = series.returns().column(0).iter().copied().collect();
        assert_eq!(returns.len(), 3);
        assert_relative_eq!(returns[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(returns[2], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_late_starting_pair_shrinks_window() {
        let h = history(&[
            ("EUR/USD", &[1.0, 1.1, 1.0, 1.1, 1.0]),
            ("GBP/USD", &[f64::NAN, f64::NAN, 1.2, 1.3, 1.2]),
        ]);
        let series = VolatilityBuilder::returns(&h).unwrap();
        assert_eq!(series.observations(), 2);
    }

    #[test]
    fn test_insufficient_history() {
        let h = history(&[("EUR/USD", &[1.0, 1.1])]);
        assert!(matches!(
            VolatilityBuilder::build(&h),
            Err(MarketDataError::InsufficientHistory { observations: 1 })
        ));
    }

    #[test]
    fn test_empty_history() {
        assert!(matches!(
            VolatilityBuilder::build(&RateHistory::new()),
            Err(MarketDataError::EmptyBasis)
        ));
    }
}
