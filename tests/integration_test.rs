//! End-to-end ingestion tests.
//!
//! Tests cover:
//! - Raw CSV text through adapter, resolver and normalizer
//! - Leftmost-header column selection on ambiguous files
//! - Spreadsheet serial dates, row filtering and stable ordering
//! - Drawdowns over both normalized prices and saved equity curves
//! - Persistence key derivation and the JSON result store

mod common;

use approx::assert_relative_eq;
use common::*;
use tabseries::adapters::csv_adapter::CsvAdapter;
use tabseries::adapters::json_result_adapter::JsonResultAdapter;
use tabseries::adapters::json_store_adapter::JsonStoreAdapter;
use tabseries::cli::{load_series, save_run_summary};
use tabseries::domain::column_resolver::resolve;
use tabseries::domain::contract::{BacktestParams, BacktestRequest, StrategyMode};
use tabseries::domain::drawdown::{derive_drawdowns, max_drawdown};
use tabseries::domain::error::IngestError;
use tabseries::domain::normalizer::normalize;
use tabseries::domain::persistence::{persistence_key, PersistenceRecord};
use tabseries::ports::result_store_port::ResultStorePort;
use tempfile::TempDir;

mod ingestion_pipeline {
    use super::*;

    #[test]
    fn messy_export_becomes_sorted_series() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "export.csv",
            "\u{feff}日期,開盤價,收盤價,成交量\n\
             2024/01/04,\"17,100\",\"17,250.5\",100\n\
             2024/01/02,\"17,000\",\"17,050\",100\n\
             ,\"17,000\",\"17,000\",100\n\
             2024/01/03,\"17,000\",--,100\n\
             45294,\"17,000\",\"17,120\",100\n",
        );

        let loaded = load_series(&CsvAdapter::default(), &path).unwrap();

        assert_eq!(loaded.binding.date_column, "日期");
        assert_eq!(loaded.binding.price_column, "收盤價");
        assert_eq!(loaded.report.kept, 3);
        assert_eq!(loaded.report.missing_cell, 1);
        assert_eq!(loaded.report.invalid_price, 1);

        let keys: Vec<&str> = loaded
            .series
            .points()
            .iter()
            .map(|p| p.date_key.as_str())
            .collect();
        assert_eq!(keys, vec!["2024-01-02", "2024-01-03", "2024-01-04"]);
        assert_eq!(loaded.series.points()[1].price, 17_120.0);
        assert_eq!(loaded.series.date_range(), (date(2024, 1, 2), date(2024, 1, 4)));
    }

    #[test]
    fn leftmost_header_is_chosen_on_ambiguous_files() {
        let table = text_table(
            &["Data", "Close", "Date", "Price"],
            &[&["2024-01-01", "10", "1999-01-01", "99"]],
        );
        let binding = resolve(&table.headers).unwrap();
        assert_eq!(binding.date_column, "Data");
        assert_eq!(binding.price_column, "Close");

        let series = normalize(&table, &binding).unwrap();
        assert_eq!(series.first().date_key, "2024-01-01");
        assert_eq!(series.first().price, 10.0);
    }

    #[test]
    fn repeated_price_header_reads_leftmost_column() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "dup.csv", "Date,Close,Close\n2024-01-01,100,999\n");

        let loaded = load_series(&CsvAdapter::default(), &path).unwrap();

        assert_eq!(loaded.binding.price_column, "Close");
        assert_eq!(loaded.series.first().price, 100.0);
    }

    #[test]
    fn zero_price_is_counted_as_invalid() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "zero.csv", "Date,Close\n2024-01-01,100\n2024-01-02,0\n");

        let loaded = load_series(&CsvAdapter::default(), &path).unwrap();

        assert_eq!(loaded.report.kept, 1);
        assert_eq!(loaded.report.missing_cell, 0);
        assert_eq!(loaded.report.invalid_price, 1);
    }

    #[test]
    fn blank_date_and_negative_price_rows_are_dropped() {
        let table = text_table(
            &["date", "price"],
            &[
                &["2024-01-01", "100"],
                &["", "101"],
                &["2024-01-02", "-5"],
                &["2024-01-03", "102.5"],
            ],
        );
        let series = normalize(&table, &resolve(&table.headers).unwrap()).unwrap();
        let pairs: Vec<(String, f64)> = series
            .points()
            .iter()
            .map(|p| (p.date_key.clone(), p.price))
            .collect();
        assert_eq!(
            pairs,
            vec![("2024-01-01".to_string(), 100.0), ("2024-01-03".to_string(), 102.5)]
        );
    }

    #[test]
    fn numeric_dates_from_csv_use_spreadsheet_epoch() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "serial.csv", "Date,Close\n1,5\n44562,6\n");
        let loaded = load_series(&CsvAdapter::default(), &path).unwrap();

        assert_eq!(loaded.series.first().date_key, "1899-12-31");
        assert_eq!(loaded.series.last().date_key, "2022-01-01");
    }

    #[test]
    fn unresolvable_headers_fail_before_normalizing() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "bad.csv", "Day,Close\n2024-01-01,1\n");
        let err = load_series(&CsvAdapter::default(), &path).unwrap_err();
        assert!(matches!(err, IngestError::DateColumnNotFound { .. }));
        assert!(err.to_string().contains("date, 日期, time, data"));
    }

    #[test]
    fn all_rows_invalid_is_no_valid_rows() {
        let port = MockTablePort::new().with_table(
            "t.csv",
            text_table(&["date", "close"], &[&["x", "1"], &["2024-01-01", "0"]]),
        );
        let err = load_series(&port, std::path::Path::new("t.csv")).unwrap_err();
        assert!(matches!(err, IngestError::NoValidRows { rows: 2 }));
    }

    #[test]
    fn mock_port_missing_table_propagates() {
        let port = MockTablePort::new();
        let err = load_series(&port, std::path::Path::new("missing.csv")).unwrap_err();
        assert!(matches!(err, IngestError::TableRead { .. }));
    }
}

mod drawdowns {
    use super::*;

    #[test]
    fn price_series_drawdowns() {
        let table = text_table(
            &["date", "close"],
            &[
                &["2024-01-05", "80"],
                &["2024-01-01", "100"],
                &["2024-01-02", "120"],
                &["2024-01-03", "90"],
                &["2024-01-04", "130"],
            ],
        );
        let series = normalize(&table, &resolve(&table.headers).unwrap()).unwrap();
        let dd = derive_drawdowns(series.points());
        let values: Vec<f64> = dd.iter().map(|d| d.drawdown).collect();

        assert_relative_eq!(values[0], 0.0);
        assert_relative_eq!(values[1], 0.0);
        assert_relative_eq!(values[2], -0.25);
        assert_relative_eq!(values[3], 0.0);
        assert_relative_eq!(values[4], -0.384_615_384_615_384_6, epsilon = 1e-12);
        assert_eq!(dd[4].date, date(2024, 1, 5));
    }

    #[test]
    fn equity_curve_drawdowns_match_reported_mdd() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "result.json", RESULT_JSON);
        let result = JsonResultAdapter::new(path).load().unwrap();

        let dd = derive_drawdowns(&result.equity_curve);
        assert_eq!(dd.len(), 4);
        assert_relative_eq!(max_drawdown(&dd), result.mdd);
        assert!(result.trade_stats.profit_factor.is_infinite());
    }
}

mod persistence {
    use super::*;

    #[test]
    fn stored_records_are_keyed_by_asset_and_period() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "result.json", RESULT_JSON);
        let result = JsonResultAdapter::new(path).load().unwrap();

        let store = JsonStoreAdapter::new(dir.path().join("store.json"));
        let key = persistence_key("S&P 500", "2020~2024/06");
        let record = PersistenceRecord::from_run(&BacktestParams::default(), &result);
        store.save(&key, &record).unwrap();

        assert_eq!(key, "S&P_500_2020-2024-06");
        assert_eq!(store.keys().unwrap(), vec![key.clone()]);
        let loaded = store.load(&key).unwrap().unwrap();
        assert_eq!(loaded.strategy, "永遠做多");
        assert_eq!(loaded.total_return, 0.3);
    }

    #[test]
    fn run_summary_goes_through_the_engine_port() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "result.json", RESULT_JSON);
        let engine = MockBacktestPort::with_result(JsonResultAdapter::new(path).load().unwrap());
        let store = JsonStoreAdapter::new(dir.path().join("store.json"));

        let table = text_table(
            &["date", "close"],
            &[&["2024-01-01", "100"], &["2024-01-02", "101"]],
        );
        let series = normalize(&table, &resolve(&table.headers).unwrap()).unwrap();
        let params = BacktestParams {
            strategy_mode: StrategyMode::DualMa,
            ma_fast: 10,
            ..BacktestParams::default()
        };
        let request = BacktestRequest::new(&series, params);

        let key = save_run_summary(&engine, &store, &request, "TAIEX", "1Y").unwrap();

        assert_eq!(key, "TAIEX_1Y");
        assert_eq!(*engine.seen_points.borrow(), vec![2]);
        let record = store.load(&key).unwrap().unwrap();
        assert_eq!(record.strategy, "雙均線策略");
        assert_eq!(record.ma_window, 10);
        assert_eq!(record.cagr, 0.12);
    }

    #[test]
    fn engine_failure_leaves_store_untouched() {
        let dir = TempDir::new().unwrap();
        let engine = MockBacktestPort {
            result: None,
            ranking: None,
            seen_points: Default::default(),
        };
        let store = JsonStoreAdapter::new(dir.path().join("store.json"));
        let request = BacktestRequest {
            data: vec![],
            params: BacktestParams::default(),
        };

        assert!(save_run_summary(&engine, &store, &request, "X", "1Y").is_err());
        assert!(store.keys().unwrap().is_empty());
    }
}
