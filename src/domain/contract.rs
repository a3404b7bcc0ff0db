//! Request/response records exchanged with the remote backtest engine.
//!
//! The engine itself is opaque; these types only fix the JSON shapes of its
//! two operations, a single backtest run and a parameter grid search.

use crate::domain::drawdown::ValuePoint;
use crate::domain::series::{PriceRecord, Series};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyMode {
    BuyHold,
    SingleMa,
    DualMa,
}

impl StrategyMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "buy-hold" => Some(StrategyMode::BuyHold),
            "single-ma" => Some(StrategyMode::SingleMa),
            "dual-ma" => Some(StrategyMode::DualMa),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyMode::BuyHold => "buy-hold",
            StrategyMode::SingleMa => "single-ma",
            StrategyMode::DualMa => "dual-ma",
        }
    }

    /// Display name used in stored summaries and grid-search rankings.
    pub fn label(self) -> &'static str {
        match self {
            StrategyMode::BuyHold => "永遠做多",
            StrategyMode::SingleMa => "單均線策略",
            StrategyMode::DualMa => "雙均線策略",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TradeDirection {
    LongOnly,
    LongShort,
}

impl TradeDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "long-only" => Some(TradeDirection::LongOnly),
            "long-short" => Some(TradeDirection::LongShort),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TradeDirection::LongOnly => "long-only",
            TradeDirection::LongShort => "long-short",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TradeDirection::LongOnly => "僅做多",
            TradeDirection::LongShort => "做多與做空",
        }
    }
}

/// Scalar parameters of a backtest request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestParams {
    pub initial_cash: f64,
    pub leverage: f64,
    pub fee_rate: f64,
    pub slippage: f64,
    pub strategy_mode: StrategyMode,
    pub ma_fast: u32,
    pub ma_slow: u32,
    pub trade_direction: TradeDirection,
    pub do_rebalance: bool,
    pub enable_yield: bool,
    pub annual_yield: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl Default for BacktestParams {
    fn default() -> Self {
        BacktestParams {
            initial_cash: 100_000.0,
            leverage: 2.0,
            fee_rate: 0.001,
            slippage: 0.0005,
            strategy_mode: StrategyMode::BuyHold,
            ma_fast: 20,
            ma_slow: 60,
            trade_direction: TradeDirection::LongOnly,
            do_rebalance: true,
            enable_yield: false,
            annual_yield: 0.04,
            start_date: None,
            end_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRequest {
    pub data: Vec<PriceRecord>,
    #[serde(flatten)]
    pub params: BacktestParams,
}

impl BacktestRequest {
    pub fn new(series: &Series, params: BacktestParams) -> Self {
        BacktestRequest {
            data: series.to_price_records(),
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl ValuePoint for EquityPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self) -> f64 {
        self.value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub direction: String,
    pub entry_date: String,
    pub exit_date: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub units: f64,
    pub pnl: f64,
    pub pnl_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub total_trades: usize,
    /// Percentage, 0-100.
    pub win_rate: f64,
    pub profit_loss_ratio: f64,
    /// `null` on the wire when there were no losing trades.
    #[serde(deserialize_with = "null_as_infinity")]
    pub profit_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub final_value: f64,
    pub total_return: f64,
    pub cagr: f64,
    pub mdd: f64,
    pub sharpe: f64,
    pub equity_curve: Vec<EquityPoint>,
    #[serde(default)]
    pub trades: Vec<TradeRecord>,
    pub trade_stats: TradeStats,
}

/// Ranking metric of a grid search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizeTarget {
    TotalReturn,
    Cagr,
    Sharpe,
    Calmar,
}

impl OptimizeTarget {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "total_return" => Some(OptimizeTarget::TotalReturn),
            "cagr" => Some(OptimizeTarget::Cagr),
            "sharpe" => Some(OptimizeTarget::Sharpe),
            "calmar" => Some(OptimizeTarget::Calmar),
            _ => None,
        }
    }
}

/// Search grid and filters of an optimization request. Ranges are inclusive
/// `[low, high]` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeParams {
    pub ma_range: [u32; 2],
    pub ma_step: u32,
    pub lev_range: [f64; 2],
    pub lev_step: f64,
    /// Upper bound on `mdd` for a combination to be ranked.
    pub max_mdd: f64,
    /// Drop combinations whose final value fell below the liquidation line.
    pub filter_liquidation: bool,
    pub target: OptimizeTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl Default for OptimizeParams {
    fn default() -> Self {
        OptimizeParams {
            ma_range: [10, 60],
            ma_step: 10,
            lev_range: [1.0, 3.0],
            lev_step: 0.5,
            max_mdd: 0.5,
            filter_liquidation: true,
            target: OptimizeTarget::TotalReturn,
            start_date: None,
            end_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub data: Vec<PriceRecord>,
    #[serde(flatten)]
    pub params: OptimizeParams,
}

impl OptimizeRequest {
    pub fn new(series: &Series, params: OptimizeParams) -> Self {
        OptimizeRequest {
            data: series.to_price_records(),
            params,
        }
    }
}

/// One ranked parameter combination. `strategy` and `direction` carry display
/// labels; buy-and-hold rows have no moving-average window (`"-"` on the wire).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRun {
    pub strategy: String,
    pub direction: String,
    #[serde(with = "window_or_dash")]
    pub ma_period: Option<u32>,
    pub leverage: f64,
    pub total_return: f64,
    pub cagr: f64,
    pub mdd: f64,
    pub sharpe: f64,
    pub calmar: f64,
    /// Absent from engine rankings, which drop liquidated rows first.
    #[serde(default)]
    pub is_liquidated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeResult {
    pub total_tested: usize,
    pub valid_results: usize,
    /// Best first, at most ten.
    pub top_results: Vec<RankedRun>,
}

mod window_or_dash {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Window(u32),
        Placeholder(String),
    }

    pub fn serialize<S>(value: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(window) => serializer.serialize_u32(*window),
            None => serializer.serialize_str("-"),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Wire::deserialize(deserializer)? {
            Wire::Window(window) => Ok(Some(window)),
            Wire::Placeholder(s) if s.trim() == "-" => Ok(None),
            Wire::Placeholder(s) => Err(serde::de::Error::custom(format!(
                "expected a window or \"-\", got {s:?}"
            ))),
        }
    }
}

fn null_as_infinity<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
}
