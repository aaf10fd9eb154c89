use crate::core::currency::CurrencyPair;
use crate::core::trade::Trade;
use crate::exposure::vector::ExposureVector;
use crate::market::basis::MarketBasis;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use thiserror::Error;

/// Replaces an exactly-zero volatility so the covariance matrix never
/// carries an all-zero row.
pub const VOLATILITY_FLOOR: f64 = 1e-6;

const CORRELATION_TOLERANCE: f64 = 1e-9;

/// Errors raised when assembling a risk model from explicit parts.
#[derive(Debug, Error, PartialEq)]
pub enum RiskModelError {
    #[error(
        "basis has {basis} pairs but got {volatilities} volatilities and a {rows}x{cols} correlation matrix"
    )]
    DimensionMismatch {
        basis: usize,
        volatilities: usize,
        rows: usize,
        cols: usize,
    },
    #[error("volatility for {pair} must be finite and non-negative, got {value}")]
    InvalidVolatility { pair: CurrencyPair, value: f64 },
    #[error("correlation ({row}, {col}) = {value} is outside [-1, 1] or not finite")]
    CorrelationOutOfRange { row: usize, col: usize, value: f64 },
    #[error("correlation matrix is not symmetric at ({row}, {col})")]
    AsymmetricCorrelation { row: usize, col: usize },
    #[error("correlation diagonal ({index}, {index}) must be 1, got {value}")]
    NonUnitDiagonal { index: usize, value: f64 },
}

/// Annualized volatility per basis pair. No entry is zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolatilityVector {
    basis: MarketBasis,
    #[serde(serialize_with = "serialize_vector")]
    values: DVector<f64>,
}

impl VolatilityVector {
    pub fn basis(&self) -> &MarketBasis {
        &self.basis
    }

    pub fn values(&self) -> &DVector<f64> {
        &self.values
    }

    pub fn get(&self, pair: &CurrencyPair) -> Option<f64> {
        self.basis.index_of(pair).map(|i| self.values[i])
    }
}

/// Pairwise correlation of basis returns: symmetric, unit diagonal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    basis: MarketBasis,
    #[serde(serialize_with = "serialize_matrix")]
    values: DMatrix<f64>,
}

impl CorrelationMatrix {
    pub fn basis(&self) -> &MarketBasis {
        &self.basis
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn get(&self, a: &CurrencyPair, b: &CurrencyPair) -> Option<f64> {
        let i = self.basis.index_of(a)?;
        let j = self.basis.index_of(b)?;
        Some(self.values[(i, j)])
    }
}

/// `σσᵀ ∘ ρ`, expressed in the same basis as its inputs. Derived only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CovarianceMatrix {
    basis: MarketBasis,
    #[serde(serialize_with = "serialize_matrix")]
    values: DMatrix<f64>,
}

impl CovarianceMatrix {
    fn derive(volatilities: &VolatilityVector, correlation: &CorrelationMatrix) -> Self {
        let sigma = &volatilities.values;
        let outer = sigma * sigma.transpose();
        Self {
            basis: volatilities.basis.clone(),
            values: outer.component_mul(&correlation.values),
        }
    }

    pub fn basis(&self) -> &MarketBasis {
        &self.basis
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn get(&self, a: &CurrencyPair, b: &CurrencyPair) -> Option<f64> {
        let i = self.basis.index_of(a)?;
        let j = self.basis.index_of(b)?;
        Some(self.values[(i, j)])
    }
}

/// A read-only variance–covariance snapshot: basis, volatilities,
/// correlations and the covariance derived from them.
///
/// Exposure vectors built through [`RiskModel::exposure`] share the
/// model's basis, which keeps vector and matrix indices aligned.
///
/// # Examples
///
/// ```
/// use fx_pfe_engine::core::currency::CurrencyPair;
/// use fx_pfe_engine::market::basis::MarketBasis;
/// use fx_pfe_engine::market::risk_model::RiskModel;
/// use nalgebra::DMatrix;
///
/// let basis = MarketBasis::new(vec![
///     CurrencyPair::new("EUR", "USD"),
///     CurrencyPair::new("GBP", "USD"),
/// ]);
/// let correlation = DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.5, 1.0]);
/// let model = RiskModel::new(basis, vec![0.10, 0.20], correlation).unwrap();
///
/// let eurusd = CurrencyPair::new("EUR", "USD");
/// let gbpusd = CurrencyPair::new("GBP", "USD");
/// let cov = model.covariance().get(&eurusd, &gbpusd).unwrap();
/// assert!((cov - 0.01).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskModel {
    volatilities: VolatilityVector,
    correlation: CorrelationMatrix,
    covariance: CovarianceMatrix,
}

impl RiskModel {
    /// Assemble a model from annualized volatilities and a correlation
    /// matrix, both ordered by `basis`. Zero volatilities are floored.
    pub fn new(
        basis: MarketBasis,
        volatilities: Vec<f64>,
        correlation: DMatrix<f64>,
    ) -> Result<Self, RiskModelError> {
        let n = basis.len();
        if volatilities.len() != n || correlation.nrows() != n || correlation.ncols() != n {
            return Err(RiskModelError::DimensionMismatch {
                basis: n,
                volatilities: volatilities.len(),
                rows: correlation.nrows(),
                cols: correlation.ncols(),
            });
        }

        for (pair, &value) in basis.iter().zip(&volatilities) {
            if !value.is_finite() || value < 0.0 {
                return Err(RiskModelError::InvalidVolatility {
                    pair: pair.clone(),
                    value,
                });
            }
        }
        validate_correlation(&correlation)?;

        let floored = volatilities.into_iter().map(floor_volatility);
        let volatilities = VolatilityVector {
            basis: basis.clone(),
            values: DVector::from_iterator(n, floored),
        };
        let correlation = CorrelationMatrix {
            basis,
            values: correlation,
        };
        let covariance = CovarianceMatrix::derive(&volatilities, &correlation);

        Ok(Self {
            volatilities,
            correlation,
            covariance,
        })
    }

    pub fn basis(&self) -> &MarketBasis {
        &self.volatilities.basis
    }

    pub fn volatilities(&self) -> &VolatilityVector {
        &self.volatilities
    }

    pub fn correlation(&self) -> &CorrelationMatrix {
        &self.correlation
    }

    pub fn covariance(&self) -> &CovarianceMatrix {
        &self.covariance
    }

    /// Project `trade` onto this model's basis.
    pub fn exposure(&self, trade: &Trade) -> ExposureVector {
        ExposureVector::for_trade(self.basis(), trade)
    }
}

fn floor_volatility(value: f64) -> f64 {
    if value == 0.0 {
        VOLATILITY_FLOOR
    } else {
        value
    }
}

fn validate_correlation(matrix: &DMatrix<f64>) -> Result<(), RiskModelError> {
    for row in 0..matrix.nrows() {
        let diag = matrix[(row, row)];
        if (diag - 1.0).abs() > CORRELATION_TOLERANCE {
            return Err(RiskModelError::NonUnitDiagonal {
                index: row,
                value: diag,
            });
        }
        for col in 0..matrix.ncols() {
            let value = matrix[(row, col)];
            if !value.is_finite() || value.abs() > 1.0 + CORRELATION_TOLERANCE {
                return Err(RiskModelError::CorrelationOutOfRange { row, col, value });
            }
            if (value - matrix[(col, row)]).abs() > CORRELATION_TOLERANCE {
                return Err(RiskModelError::AsymmetricCorrelation { row, col });
            }
        }
    }
    Ok(())
}

fn serialize_vector<S: serde::Serializer>(v: &DVector<f64>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(v.iter())
}

fn serialize_matrix<S: serde::Serializer>(m: &DMatrix<f64>, s: S) -> Result<S::Ok, S::Error> {
    let rows: Vec<Vec<f64>> = m
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect();
    s.collect_seq(rows)
}
