#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tabseries::domain::contract::{
    BacktestRequest, BacktestResult, OptimizeRequest, OptimizeResult,
};
use tabseries::domain::error::IngestError;
use tabseries::domain::table::{Cell, Table};
use tabseries::ports::backtest_port::BacktestPort;
use tabseries::ports::table_port::TablePort;
use tempfile::TempDir;

/// Serves prepared tables by file name without touching the disk.
pub struct MockTablePort {
    pub tables: HashMap<PathBuf, Table>,
}

impl MockTablePort {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    pub fn with_table(mut self, path: &str, table: Table) -> Self {
        self.tables.insert(PathBuf::from(path), table);
        self
    }
}

impl TablePort for MockTablePort {
    fn load_table(&self, path: &Path) -> Result<Table, IngestError> {
        self.tables
            .get(path)
            .cloned()
            .ok_or_else(|| IngestError::TableRead {
                path: path.display().to_string(),
                reason: "no such table".into(),
            })
    }
}

/// Engine stand-in that answers with prepared results and remembers how many
/// price points each request carried.
pub struct MockBacktestPort {
    pub result: Option<BacktestResult>,
    pub ranking: Option<OptimizeResult>,
    pub seen_points: RefCell<Vec<usize>>,
}

impl MockBacktestPort {
    pub fn with_result(result: BacktestResult) -> Self {
        Self {
            result: Some(result),
            ranking: None,
            seen_points: RefCell::new(Vec::new()),
        }
    }

    fn unavailable() -> IngestError {
        IngestError::Io(std::io::Error::other("engine unavailable"))
    }
}

impl BacktestPort for MockBacktestPort {
    fn run(&self, request: &BacktestRequest) -> Result<BacktestResult, IngestError> {
        self.seen_points.borrow_mut().push(request.data.len());
        self.result.clone().ok_or_else(Self::unavailable)
    }

    fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizeResult, IngestError> {
        self.seen_points.borrow_mut().push(request.data.len());
        self.ranking.clone().ok_or_else(Self::unavailable)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn text_table(headers: &[&str], rows: &[&[&str]]) -> Table {
    let mut table = Table::new(headers.iter().map(|h| h.to_string()).collect());
    for row in rows {
        table.push_row(row.iter().map(|c| Cell::from(*c)));
    }
    table
}

pub fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

pub const RESULT_JSON: &str = r#"{
    "final_value": 130000.0,
    "total_return": 0.3,
    "cagr": 0.12,
    "mdd": 0.25,
    "sharpe": 1.05,
    "equity_curve": [
        {"date": "2024-01-01", "value": 100000.0},
        {"date": "2024-01-02", "value": 120000.0},
        {"date": "2024-01-03", "value": 90000.0},
        {"date": "2024-01-04", "value": 130000.0}
    ],
    "trades": [],
    "trade_stats": {"total_trades": 2, "win_rate": 100.0,
                    "profit_loss_ratio": 0.0, "profit_factor": Infinity}
}"#;

pub const OPTIMIZE_JSON: &str = r#"{
    "total_tested": 24,
    "valid_results": 2,
    "top_results": [
        {"strategy": "單均線策略", "direction": "僅做多", "ma_period": 20,
         "leverage": 2.0, "total_return": 1.4, "cagr": 0.21, "mdd": 0.35,
         "sharpe": 1.1, "calmar": 0.6},
        {"strategy": "永遠做多", "direction": "-", "ma_period": "-",
         "leverage": 1.0, "total_return": 0.6, "cagr": 0.1, "mdd": 0.3,
         "sharpe": 0.8, "calmar": 0.333}
    ]
}"#;
