use crate::exposure::policy::{Engine, PfePolicy};
use crate::exposure::vector::ExposureVector;
use crate::market::risk_model::CovarianceMatrix;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.99;

#[derive(Debug, Error, PartialEq)]
pub enum PfeError {
    #[error("confidence level must lie strictly between 0 and 1, got {0}")]
    InvalidConfidenceLevel(f64),
}

/// Uncollateralized and collateralized PFE for one horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PfeOutcome {
    pub uncollateralized: f64,
    pub collateralized: f64,
}

impl PfeOutcome {
    pub const ZERO: PfeOutcome = PfeOutcome {
        uncollateralized: 0.0,
        collateralized: 0.0,
    };
}

/// Parametric PFE under one policy and confidence level.
///
/// ```text
/// variance = eᵀ (Σ · f(days)) e
/// pfe      = √variance · Φ⁻¹(level) · multiplier
/// collat   = max(0, pfe − collateral · effectiveness)
/// ```
///
/// The quantile is resolved once at construction.
///
/// # Examples
///
/// ```
/// use fx_pfe_engine::core::currency::CurrencyPair;
/// use fx_pfe_engine::exposure::pfe::PfeCalculator;
/// use fx_pfe_engine::exposure::policy::Engine;
/// use fx_pfe_engine::exposure::vector::ExposureVector;
/// use fx_pfe_engine::market::basis::MarketBasis;
/// use fx_pfe_engine::market::risk_model::RiskModel;
/// use nalgebra::DMatrix;
///
/// let basis = MarketBasis::new(vec![CurrencyPair::new("EUR", "USD")]);
/// let model = RiskModel::new(basis.clone(), vec![0.10], DMatrix::identity(1, 1)).unwrap();
/// let exposure = ExposureVector::from_values(&basis, vec![1_000_000.0]);
///
/// let calc = PfeCalculator::for_engine(Engine::F22, 0.99).unwrap();
/// let outcome = calc.calculate(&exposure, 365, model.covariance(), 0.0);
/// // one year at 10% vol: 100k standard deviations, z(0.99) ≈ 2.326
/// assert!((outcome.uncollateralized - 232_634.8).abs() < 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PfeCalculator {
    policy: PfePolicy,
    confidence_level: f64,
    z_score: f64,
}

impl PfeCalculator {
    pub fn new(policy: PfePolicy, confidence_level: f64) -> Result<Self, PfeError> {
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(PfeError::InvalidConfidenceLevel(confidence_level));
        }
        Ok(Self {
            policy,
            confidence_level,
            z_score: Normal::standard().inverse_cdf(confidence_level),
        })
    }

    pub fn for_engine(engine: Engine, confidence_level: f64) -> Result<Self, PfeError> {
        Self::new(engine.policy(), confidence_level)
    }

    pub fn policy(&self) -> &PfePolicy {
        &self.policy
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Standard normal quantile at the confidence level.
    pub fn z_score(&self) -> f64 {
        self.z_score
    }

    /// `eᵀ (Σ · f(days)) e` for the policy's time scaling.
    pub fn horizon_variance(
        &self,
        exposure: &ExposureVector,
        days: u32,
        covariance: &CovarianceMatrix,
    ) -> f64 {
        debug_assert!(
            exposure.basis().is_aligned_with(covariance.basis()),
            "exposure basis {} does not match covariance basis {}",
            exposure.basis(),
            covariance.basis()
        );
        let scaled = covariance.values() * self.policy.time_scaling.factor(days);
        let e = exposure.values();
        e.dot(&(scaled * e))
    }

    pub fn calculate(
        &self,
        exposure: &ExposureVector,
        days: u32,
        covariance: &CovarianceMatrix,
        collateral_factor: f64,
    ) -> PfeOutcome {
        if exposure.is_zero() {
            return PfeOutcome::ZERO;
        }
        let variance = self.horizon_variance(exposure, days, covariance);
        // also catches NaN
        if !(variance > 0.0) {
            return PfeOutcome::ZERO;
        }

        let pfe = variance.sqrt() * self.z_score * self.policy.pfe_multiplier;
        let collateralized =
            (pfe - collateral_factor * self.policy.collateral_effectiveness).max(0.0);
        PfeOutcome {
            uncollateralized: pfe,
            collateralized,
        }
    }
}
