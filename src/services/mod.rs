// src/services/mod.rs
pub mod calculations;
pub mod export;
pub mod scheduler;
pub mod store;
pub mod valuation;
pub mod watchlist;
pub mod yahoo;
