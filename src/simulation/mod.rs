pub mod trade_generator;
