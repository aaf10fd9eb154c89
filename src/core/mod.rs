pub mod counterparty;
pub mod currency;
pub mod trade;
