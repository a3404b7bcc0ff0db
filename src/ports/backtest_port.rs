//! Remote backtest engine port trait.

use crate::domain::contract::{BacktestRequest, BacktestResult, OptimizeRequest, OptimizeResult};
use crate::domain::error::IngestError;

/// One request in, one result out. Transport, retries and auth belong to the
/// implementation.
pub trait BacktestPort {
    fn run(&self, request: &BacktestRequest) -> Result<BacktestResult, IngestError>;

    /// Grid search over moving-average windows and leverage.
    fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizeResult, IngestError>;
}
