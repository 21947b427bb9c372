// src/handlers/mod.rs
pub mod companies;
pub mod dashboard;
pub mod error;
pub mod preferences;
pub mod symbols;
