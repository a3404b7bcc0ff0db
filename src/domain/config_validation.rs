//! Configuration validation and request parameter assembly.

use crate::domain::contract::{
    BacktestParams, OptimizeParams, OptimizeTarget, StrategyMode, TradeDirection,
};
use crate::domain::error::IngestError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

const SECTION: &str = "backtest";
const OPTIMIZE_SECTION: &str = "optimize";

/// Read `[backtest]` into [`BacktestParams`], applying defaults for absent keys
/// and rejecting out-of-range values.
pub fn build_backtest_params(config: &dyn ConfigPort) -> Result<BacktestParams, IngestError> {
    let defaults = BacktestParams::default();

    let initial_cash = positive(config, SECTION, "initial_cash", defaults.initial_cash)?;
    let leverage = positive(config, SECTION, "leverage", defaults.leverage)?;

    let fee_rate = unit_rate(config, "fee_rate", defaults.fee_rate)?;
    let slippage = unit_rate(config, "slippage", defaults.slippage)?;
    let annual_yield = unit_rate(config, "annual_yield", defaults.annual_yield)?;

    let ma_fast = window(config, SECTION, "ma_fast", defaults.ma_fast)?;
    let ma_slow = window(config, SECTION, "ma_slow", defaults.ma_slow)?;

    let strategy_mode = match config.get_non_empty(SECTION, "strategy_mode") {
        None => defaults.strategy_mode,
        Some(s) => StrategyMode::parse(&s).ok_or_else(|| {
            invalid(
                SECTION,
                "strategy_mode",
                "strategy_mode must be one of buy-hold, single-ma, dual-ma",
            )
        })?,
    };

    let trade_direction = match config.get_non_empty(SECTION, "trade_direction") {
        None => defaults.trade_direction,
        Some(s) => TradeDirection::parse(&s).ok_or_else(|| {
            invalid(
                SECTION,
                "trade_direction",
                "trade_direction must be long-only or long-short",
            )
        })?,
    };

    let (start_date, end_date) = date_bounds(config, SECTION)?;

    Ok(BacktestParams {
        initial_cash,
        leverage,
        fee_rate,
        slippage,
        strategy_mode,
        ma_fast,
        ma_slow,
        trade_direction,
        do_rebalance: config.get_bool(SECTION, "do_rebalance", defaults.do_rebalance),
        enable_yield: config.get_bool(SECTION, "enable_yield", defaults.enable_yield),
        annual_yield,
        start_date,
        end_date,
    })
}

/// Read `[optimize]` into [`OptimizeParams`]. The grid is
/// `ma_min..=ma_max` by `ma_step` and `lev_min..=lev_max` by `lev_step`.
pub fn build_optimize_params(config: &dyn ConfigPort) -> Result<OptimizeParams, IngestError> {
    let defaults = OptimizeParams::default();
    let [ma_min_default, ma_max_default] = defaults.ma_range;
    let [lev_min_default, lev_max_default] = defaults.lev_range;

    let ma_min = window(config, OPTIMIZE_SECTION, "ma_min", ma_min_default)?;
    let ma_max = window(config, OPTIMIZE_SECTION, "ma_max", ma_max_default)?;
    if ma_max < ma_min {
        return Err(invalid(OPTIMIZE_SECTION, "ma_max", "ma_max must not be below ma_min"));
    }
    let ma_step = window(config, OPTIMIZE_SECTION, "ma_step", defaults.ma_step)?;

    let lev_min = positive(config, OPTIMIZE_SECTION, "lev_min", lev_min_default)?;
    let lev_max = positive(config, OPTIMIZE_SECTION, "lev_max", lev_max_default)?;
    if lev_max < lev_min {
        return Err(invalid(OPTIMIZE_SECTION, "lev_max", "lev_max must not be below lev_min"));
    }
    let lev_step = positive(config, OPTIMIZE_SECTION, "lev_step", defaults.lev_step)?;
    let max_mdd = positive(config, OPTIMIZE_SECTION, "max_mdd", defaults.max_mdd)?;

    let target = match config.get_non_empty(OPTIMIZE_SECTION, "target") {
        None => defaults.target,
        Some(s) => OptimizeTarget::parse(&s).ok_or_else(|| {
            invalid(
                OPTIMIZE_SECTION,
                "target",
                "target must be one of total_return, cagr, sharpe, calmar",
            )
        })?,
    };

    let (start_date, end_date) = date_bounds(config, OPTIMIZE_SECTION)?;

    Ok(OptimizeParams {
        ma_range: [ma_min, ma_max],
        ma_step,
        lev_range: [lev_min, lev_max],
        lev_step,
        max_mdd,
        filter_liquidation: config.get_bool(
            OPTIMIZE_SECTION,
            "filter_liquidation",
            defaults.filter_liquidation,
        ),
        target,
        start_date,
        end_date,
    })
}

fn invalid(section: &str, key: &str, reason: &str) -> IngestError {
    IngestError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, IngestError> {
    let value = config.get_double(section, key, default);
    if value <= 0.0 || value.is_nan() {
        return Err(invalid(section, key, &format!("{key} must be positive")));
    }
    Ok(value)
}

/// A `[backtest]` rate in [0, 1).
fn unit_rate(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, IngestError> {
    let value = config.get_double(SECTION, key, default);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(SECTION, key, &format!("{key} must be between 0 and 1")));
    }
    Ok(value)
}

fn window(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: u32,
) -> Result<u32, IngestError> {
    let value = config.get_int(section, key, i64::from(default));
    u32::try_from(value)
        .ok()
        .filter(|&w| w >= 1)
        .ok_or_else(|| invalid(section, key, &format!("{key} must be at least 1")))
}

fn optional_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, IngestError> {
    config
        .get_non_empty(section, key)
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
                invalid(section, key, &format!("invalid {key} format, expected YYYY-MM-DD"))
            })
        })
        .transpose()
}

type DateBounds = (Option<NaiveDate>, Option<NaiveDate>);

fn date_bounds(config: &dyn ConfigPort, section: &str) -> Result<DateBounds, IngestError> {
    let start = optional_date(config, section, "start_date")?;
    let end = optional_date(config, section, "end_date")?;
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(invalid(section, "start_date", "start_date must not be after end_date"));
        }
    }
    Ok((start, end))
}
