//! # fx-pfe-engine
//!
//! Parametric potential future exposure (PFE) engine for FX forward
//! portfolios.
//!
//! Given historical spot rates and a population of FX forwards, this
//! engine estimates a variance-covariance model of the major currency
//! pairs, projects each trade onto it and computes PFE over a grid of
//! daily horizons under the F22 or QUIC policy.
//!
//! ## Architecture
//!
//! - **core** — Foundational types: currencies, pairs, identifiers, trades
//! - **market** — Rate history, market basis, volatility and correlation estimation
//! - **exposure** — Exposure vectors, policies, the PFE calculator and batch runner
//! - **analytics** — Query scoping, impact breakdowns, horizon profiles
//! - **store** — Per-engine trade and result tables (CSV or in-memory)
//! - **simulation** — Synthetic trade generation
//! - **config** — TOML engine configuration

pub mod analytics;
pub mod config;
pub mod core;
pub mod exposure;
pub mod market;
pub mod simulation;
pub mod store;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::analytics::aggregator::PfeAnalysis;
    pub use crate::analytics::query::{PfeQuery, QueryError};
    pub use crate::config::EngineConfig;
    pub use crate::core::counterparty::{CounterpartyId, TransactionId};
    pub use crate::core::currency::{CurrencyCode, CurrencyPair};
    pub use crate::core::trade::{Leg, Trade, TradeSet};
    pub use crate::exposure::batch::{BatchRunner, HorizonGrid, PfeResult};
    pub use crate::exposure::pfe::{PfeCalculator, PfeOutcome};
    pub use crate::exposure::policy::{Engine, PfePolicy};
    pub use crate::exposure::vector::ExposureVector;
    pub use crate::market::basis::MarketBasis;
    pub use crate::market::rate_history::{CsvRateSource, RateHistory, RateSource};
    pub use crate::market::risk_model::RiskModel;
    pub use crate::market::volatility::VolatilityBuilder;
    pub use crate::store::{open_store, PfeStore};
}
