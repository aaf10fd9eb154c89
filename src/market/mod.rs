pub mod basis;
pub mod rate_history;
pub mod risk_model;
pub mod volatility;
