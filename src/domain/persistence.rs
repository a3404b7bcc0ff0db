//! Stored summary of a backtest run and the key it is filed under.

use crate::domain::contract::{BacktestParams, BacktestResult};
use serde::{Deserialize, Serialize};

/// `{asset_name}_{backtest_period}` made key-safe: whitespace becomes `_`,
/// `~` and `/` become `-`. Existing stored records depend on this exact rule.
pub fn persistence_key(asset_name: &str, backtest_period: &str) -> String {
    format!("{asset_name}_{backtest_period}")
        .chars()
        .map(|c| match c {
            c if c.is_whitespace() => '_',
            '~' | '/' => '-',
            c => c,
        })
        .collect()
}

/// Summary row of one run. `strategy` and `direction` hold display labels, as
/// in [`RankedRun`](crate::domain::contract::RankedRun).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceRecord {
    pub strategy: String,
    pub direction: String,
    pub ma_window: u32,
    pub leverage: f64,
    pub total_return: f64,
    pub cagr: f64,
    pub mdd: f64,
    pub sharpe: f64,
}

impl PersistenceRecord {
    pub fn from_run(params: &BacktestParams, result: &BacktestResult) -> Self {
        PersistenceRecord {
            strategy: params.strategy_mode.label().to_string(),
            direction: params.trade_direction.label().to_string(),
            ma_window: params.ma_fast,
            leverage: params.leverage,
            total_return: result.total_return,
            cagr: result.cagr,
            mdd: result.mdd,
            sharpe: result.sharpe,
        }
    }
}
