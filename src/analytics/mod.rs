pub mod aggregator;
pub mod directory;
pub mod profile;
pub mod query;
