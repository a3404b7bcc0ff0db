//! Replays a saved backtest engine response from disk.

use crate::domain::contract::{BacktestRequest, BacktestResult, OptimizeRequest, OptimizeResult};
use crate::domain::error::IngestError;
use crate::ports::backtest_port::BacktestPort;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct JsonResultAdapter {
    path: PathBuf,
}

impl JsonResultAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<BacktestResult, IngestError> {
        let result: BacktestResult = self.load_as()?;
        debug!(
            path = %self.path.display(),
            equity_points = result.equity_curve.len(),
            "loaded backtest result"
        );
        Ok(result)
    }

    fn load_as<T: DeserializeOwned>(&self) -> Result<T, IngestError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&non_finite_to_null(&content))?)
    }
}

const NON_FINITE_TOKENS: [&str; 3] = ["-Infinity", "Infinity", "NaN"];

/// The engine writes non-finite floats as bare `Infinity`, `-Infinity` and
/// `NaN`, which JSON does not allow. Rewrite them to `null` outside strings.
fn non_finite_to_null(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut rest = json;
    let mut in_string = false;

    while let Some(c) = rest.chars().next() {
        if in_string {
            match c {
                '\\' => {
                    let escaped: String = rest.chars().take(2).collect();
                    out.push_str(&escaped);
                    rest = &rest[escaped.len()..];
                    continue;
                }
                '"' => in_string = false,
                _ => {}
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(token) = NON_FINITE_TOKENS.iter().find(|t| rest.starts_with(**t)) {
            out.push_str("null");
            rest = &rest[token.len()..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

impl BacktestPort for JsonResultAdapter {
    /// The request is not sent anywhere; the saved response is returned as-is.
    fn run(&self, request: &BacktestRequest) -> Result<BacktestResult, IngestError> {
        debug!(points = request.data.len(), "replaying saved result");
        self.load()
    }

    fn optimize(&self, request: &OptimizeRequest) -> Result<OptimizeResult, IngestError> {
        debug!(points = request.data.len(), "replaying saved optimization");
        let result: OptimizeResult = self.load_as()?;
        debug!(
            path = %self.path.display(),
            ranked = result.top_results.len(),
            "loaded optimization result"
        );
        Ok(result)
    }
}
