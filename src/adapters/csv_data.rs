//! CSV file market data adapter.
//!
//! Bar files live under a base directory as `{code}_{period}.csv` with
//! columns `time,open,high,low,close,volume,amount`. Sector membership is
//! read from `sectors.csv` (`sector_key,code`) and symbol metadata from
//! `symbols.csv` (`code,name,listing_date,float_cap`). A movable time
//! cursor makes replayed sessions see only bars up to "now".

use crate::domain::error::HeattraderError;
use crate::domain::ohlcv::{Bar, Period};
use crate::ports::market_data::MarketDataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

struct SymbolMeta {
    name: String,
    listing_date: Option<NaiveDate>,
    float_cap: Option<f64>,
}

pub struct CsvMarketData {
    base_path: PathBuf,
    sectors: HashMap<String, Vec<String>>,
    symbols: HashMap<String, SymbolMeta>,
    now: RefCell<Option<NaiveDateTime>>,
}

impl CsvMarketData {
    /// Open a data directory, reading the sector and symbol tables up
    /// front. Missing tables are treated as empty.
    pub fn open(base_path: PathBuf) -> Result<Self, HeattraderError> {
        let sectors = load_sectors(&base_path.join("sectors.csv"))?;
        let symbols = load_symbols(&base_path.join("symbols.csv"))?;
        Ok(Self {
            base_path,
            sectors,
            symbols,
            now: RefCell::new(None),
        })
    }

    /// Clamp all subsequent bar queries to this instant.
    pub fn set_now(&self, now: NaiveDateTime) {
        *self.now.borrow_mut() = Some(now);
    }

    /// All symbols with at least one daily bar file.
    pub fn list_symbols(&self) -> Result<Vec<String>, HeattraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| HeattraderError::DataSource {
            reason: format!("failed to read {}: {}", self.base_path.display(), e),
        })?;
        let suffix = format!("_{}.csv", Period::Day);
        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| HeattraderError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(code) = name.strip_suffix(&suffix) {
                symbols.push(code.to_string());
            }
        }
        symbols.sort();
        Ok(symbols)
    }

    fn bar_path(&self, code: &str, period: Period) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", code, period))
    }

    fn read_bars(&self, code: &str, period: Period) -> Result<Option<Vec<Bar>>, HeattraderError> {
        let path = self.bar_path(code, period);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(HeattraderError::DataSource {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| HeattraderError::DataSource {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            bars.push(parse_bar(code, &record, &path)?);
        }
        bars.sort_by_key(|b| b.time);
        Ok(Some(bars))
    }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
    path: &PathBuf,
) -> Result<&'r str, HeattraderError> {
    record.get(index).ok_or_else(|| HeattraderError::DataSource {
        reason: format!("missing {} column in {}", name, path.display()),
    })
}

fn parse_bar(
    code: &str,
    record: &csv::StringRecord,
    path: &PathBuf,
) -> Result<Bar, HeattraderError> {
    let time_str = field(record, 0, "time", path)?;
    let time = NaiveDateTime::parse_from_str(time_str, "%Y-%m-%d %H:%M:%S").map_err(|e| {
        HeattraderError::DataSource {
            reason: format!("invalid time in {}: {}", path.display(), e),
        }
    })?;

    fn num<T: std::str::FromStr>(
        value: &str,
        name: &str,
        path: &PathBuf,
    ) -> Result<T, HeattraderError>
    where
        T::Err: std::fmt::Display,
    {
        value.parse().map_err(|e| HeattraderError::DataSource {
            reason: format!("invalid {} value in {}: {}", name, path.display(), e),
        })
    }

    Ok(Bar {
        code: code.to_string(),
        time,
        open: num(field(record, 1, "open", path)?, "open", path)?,
        high: num(field(record, 2, "high", path)?, "high", path)?,
        low: num(field(record, 3, "low", path)?, "low", path)?,
        close: num(field(record, 4, "close", path)?, "close", path)?,
        volume: num(field(record, 5, "volume", path)?, "volume", path)?,
        amount: num(field(record, 6, "amount", path)?, "amount", path)?,
    })
}

fn load_sectors(path: &PathBuf) -> Result<HashMap<String, Vec<String>>, HeattraderError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => {
            return Err(HeattraderError::DataSource {
                reason: format!("failed to read {}: {}", path.display(), e),
            });
        }
    };
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut sectors: HashMap<String, Vec<String>> = HashMap::new();
    for result in rdr.records() {
        let record = result.map_err(|e| HeattraderError::DataSource {
            reason: format!("CSV parse error in {}: {}", path.display(), e),
        })?;
        let key = field(&record, 0, "sector_key", path)?;
        let code = field(&record, 1, "code", path)?;
        sectors
            .entry(key.to_string())
            .or_default()
            .push(code.to_string());
    }
    Ok(sectors)
}

fn load_symbols(path: &PathBuf) -> Result<HashMap<String, SymbolMeta>, HeattraderError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => {
            return Err(HeattraderError::DataSource {
                reason: format!("failed to read {}: {}", path.display(), e),
            });
        }
    };
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut symbols = HashMap::new();
    for result in rdr.records() {
        let record = result.map_err(|e| HeattraderError::DataSource {
            reason: format!("CSV parse error in {}: {}", path.display(), e),
        })?;
        let code = field(&record, 0, "code", path)?.to_string();
        let name = field(&record, 1, "name", path)?.to_string();
        let listing_date = record
            .get(2)
            .filter(|s| !s.is_empty())
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
        let float_cap = record
            .get(3)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse().ok());
        symbols.insert(
            code,
            SymbolMeta {
                name,
                listing_date,
                float_cap,
            },
        );
    }
    Ok(symbols)
}

impl MarketDataPort for CsvMarketData {
    fn bars(
        &self,
        codes: &[String],
        period: Period,
        count: usize,
    ) -> Result<HashMap<String, Vec<Bar>>, HeattraderError> {
        let now = *self.now.borrow();
        let mut out = HashMap::new();
        for code in codes {
            let Some(mut bars) = self.read_bars(code, period)? else {
                continue;
            };
            if let Some(cutoff) = now {
                bars.retain(|b| b.time <= cutoff);
            }
            let start = bars.len().saturating_sub(count);
            let tail = bars.split_off(start);
            if !tail.is_empty() {
                out.insert(code.clone(), tail);
            }
        }
        Ok(out)
    }

    fn sector_members(&self, sector_key: &str) -> Result<Vec<String>, HeattraderError> {
        Ok(self.sectors.get(sector_key).cloned().unwrap_or_default())
    }

    fn symbol_name(&self, code: &str) -> Option<String> {
        self.symbols.get(code).map(|m| m.name.clone())
    }

    fn listing_date(&self, code: &str) -> Option<NaiveDate> {
        self.symbols.get(code).and_then(|m| m.listing_date)
    }

    fn float_cap(&self, code: &str) -> Option<f64> {
        self.symbols.get(code).and_then(|m| m.float_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) {
        let mut file = fs::File::create(dir.path().join(name)).unwrap();
        write!(file, "{}", content).unwrap();
    }

    fn sample_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "600001.SH_1d.csv",
            "time,open,high,low,close,volume,amount\n\
             2025-06-27 15:00:00,10.0,10.2,9.9,10.1,1000,10100\n\
             2025-06-30 15:00:00,10.1,10.4,10.0,10.3,1200,12360\n",
        );
        write_file(&dir, "sectors.csv", "sector_key,code\nSW1-banks,600001.SH\n");
        write_file(
            &dir,
            "symbols.csv",
            "code,name,listing_date,float_cap\n600001.SH,Example Bank,2010-01-04,1000000000\n",
        );
        dir
    }

    #[test]
    fn reads_trailing_bars() {
        let dir = sample_dir();
        let data = CsvMarketData::open(dir.path().to_path_buf()).unwrap();
        let bars = data
            .bars(&["600001.SH".to_string()], Period::Day, 1)
            .unwrap()
            .remove("600001.SH")
            .unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 10.3);
    }

    #[test]
    fn cursor_hides_future_bars() {
        let dir = sample_dir();
        let data = CsvMarketData::open(dir.path().to_path_buf()).unwrap();
        data.set_now(
            NaiveDate::from_ymd_opt(2025, 6, 27)
                .unwrap()
                .and_hms_opt(23, 59, 59)
                .unwrap(),
        );
        let bars = data
            .bars(&["600001.SH".to_string()], Period::Day, 10)
            .unwrap()
            .remove("600001.SH")
            .unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 10.1);
    }

    #[test]
    fn unknown_symbol_is_omitted_not_an_error() {
        let dir = sample_dir();
        let data = CsvMarketData::open(dir.path().to_path_buf()).unwrap();
        let map = data
            .bars(&["999999.SZ".to_string()], Period::Day, 5)
            .unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn sector_and_metadata_tables_load() {
        let dir = sample_dir();
        let data = CsvMarketData::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(
            data.sector_members("SW1-banks").unwrap(),
            vec!["600001.SH".to_string()]
        );
        assert_eq!(data.symbol_name("600001.SH").unwrap(), "Example Bank");
        assert_eq!(
            data.listing_date("600001.SH").unwrap(),
            NaiveDate::from_ymd_opt(2010, 1, 4).unwrap()
        );
        assert_eq!(data.float_cap("600001.SH").unwrap(), 1e9);
    }

    #[test]
    fn malformed_row_is_reported() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "600001.SH_1d.csv",
            "time,open,high,low,close,volume,amount\nnot-a-time,1,2,3,4,5,6\n",
        );
        let data = CsvMarketData::open(dir.path().to_path_buf()).unwrap();
        let err = data
            .bars(&["600001.SH".to_string()], Period::Day, 1)
            .unwrap_err();
        assert!(matches!(err, HeattraderError::DataSource { .. }));
    }

    #[test]
    fn list_symbols_finds_daily_files() {
        let dir = sample_dir();
        let data = CsvMarketData::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(data.list_symbols().unwrap(), vec!["600001.SH".to_string()]);
    }
}
