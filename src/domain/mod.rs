//! Core domain types and logic.

pub mod table;
pub mod column_resolver;
pub mod cell_parse;
pub mod series;
pub mod normalizer;
pub mod drawdown;
pub mod contract;
pub mod persistence;
pub mod config_validation;
pub mod error;
