//! INI file configuration adapter.

use crate::domain::error::IngestError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, IngestError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| IngestError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, IngestError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| IngestError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .and_then(|v| Self::parse_bool(&v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[backtest]
initial_cash = 250000
leverage = 1.5
strategy_mode = dual-ma
ma_fast = 10
do_rebalance = no

[input]
delimiter = |

[storage]
path = results.json
"#;

    #[test]
    fn reads_typed_values() {
        let adapter = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(adapter.get_double("backtest", "initial_cash", 0.0), 250_000.0);
        assert_eq!(adapter.get_double("backtest", "leverage", 0.0), 1.5);
        assert_eq!(adapter.get_int("backtest", "ma_fast", 0), 10);
        assert!(!adapter.get_bool("backtest", "do_rebalance", true));
        assert_eq!(
            adapter.get_string("backtest", "strategy_mode"),
            Some("dual-ma".to_string())
        );
        assert_eq!(adapter.get_string("input", "delimiter"), Some("|".to_string()));
    }

    #[test]
    fn missing_or_malformed_values_fall_back_to_default() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nma_fast = ten\nleverage = x\n").unwrap();
        assert_eq!(adapter.get_int("backtest", "ma_fast", 20), 20);
        assert_eq!(adapter.get_double("backtest", "leverage", 2.0), 2.0);
        assert_eq!(adapter.get_int("backtest", "ma_slow", 60), 60);
        assert!(adapter.get_bool("backtest", "do_rebalance", true));
        assert_eq!(adapter.get_string("storage", "path"), None);
    }

    #[test]
    fn bool_spellings() {
        let adapter = FileConfigAdapter::from_string(
            "[flags]\na = true\nb = YES\nc = on\nd = 0\ne = off\nf = maybe\n",
        )
        .unwrap();
        assert!(adapter.get_bool("flags", "a", false));
        assert!(adapter.get_bool("flags", "b", false));
        assert!(adapter.get_bool("flags", "c", false));
        assert!(!adapter.get_bool("flags", "d", true));
        assert!(!adapter.get_bool("flags", "e", true));
        assert!(adapter.get_bool("flags", "f", true));
    }

    #[test]
    fn non_empty_strings_are_trimmed() {
        let adapter = FileConfigAdapter::from_string("[backtest]\nstart_date =   \n").unwrap();
        assert_eq!(adapter.get_non_empty("backtest", "start_date"), None);
    }

    #[test]
    fn from_file_reads_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{SAMPLE}").unwrap();
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("storage", "path"),
            Some("results.json".to_string())
        );
    }

    #[test]
    fn from_file_missing_is_config_parse_error() {
        let err = FileConfigAdapter::from_file("/nonexistent/path/config.ini").unwrap_err();
        assert!(matches!(err, IngestError::ConfigParse { .. }));
    }
}
