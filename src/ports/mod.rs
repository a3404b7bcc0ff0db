//! Port traits at the I/O seams.

pub mod backtest_port;
pub mod config_port;
pub mod result_store_port;
pub mod table_port;
