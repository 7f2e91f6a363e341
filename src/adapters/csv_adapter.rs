//! CSV file market data adapter.
//!
//! Directory layout: `universe.csv` (symbol,name,market_cap) lists the
//! candidate universe, `calendar.csv` (date) lists trade days, and each
//! symbol has a `<symbol>.csv` of daily bars (date,open,high,low,close,
//! volume). Realtime quotes are synthesized from the last two closes, which
//! is what "realtime" means for a file-backed source.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use serde::Deserialize;

use crate::domain::candidate::{Candidate, Quote};
use crate::domain::error::SieveError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::MarketDataSource;

pub struct CsvDataAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct UniverseRecord {
    symbol: String,
    name: String,
    market_cap: f64,
}

#[derive(Debug, Deserialize)]
struct BarRecord {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
}

#[derive(Debug, Deserialize)]
struct CalendarRecord {
    date: NaiveDate,
}

impl CsvDataAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn read_file(&self, name: &str, context: &str) -> Result<String, SieveError> {
        let path = self.base_path.join(name);
        fs::read_to_string(&path).map_err(|e| SieveError::DataSource {
            context: context.to_string(),
            reason: format!("failed to read {}: {e}", path.display()),
        })
    }

    fn read_bars(&self, symbol: &str) -> Result<Vec<OhlcvBar>, SieveError> {
        let content = self.read_file(&format!("{symbol}.csv"), symbol)?;
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();
        for record in reader.deserialize::<BarRecord>() {
            let record = record.map_err(|e| SieveError::DataSource {
                context: symbol.to_string(),
                reason: format!("CSV parse error: {e}"),
            })?;
            bars.push(OhlcvBar {
                date: record.date,
                open: record.open,
                high: record.high,
                low: record.low,
                close: record.close,
                volume: record.volume,
            });
        }
        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

impl MarketDataSource for CsvDataAdapter {
    fn list_candidates(&self, _as_of: Option<NaiveDate>) -> Result<Vec<Candidate>, SieveError> {
        let content = self.read_file("universe.csv", "universe")?;
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let mut candidates = Vec::new();
        for record in reader.deserialize::<UniverseRecord>() {
            let record = record.map_err(|e| SieveError::DataSource {
                context: "universe".to_string(),
                reason: format!("CSV parse error: {e}"),
            })?;
            candidates.push(Candidate {
                symbol: record.symbol,
                display_name: record.name,
                market_cap: record.market_cap,
            });
        }
        Ok(candidates)
    }

    fn get_history(
        &self,
        symbol: &str,
        window_days: u32,
        min_bars: usize,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, SieveError> {
        let mut bars = self.read_bars(symbol)?;
        if let Some(end) = as_of {
            bars.retain(|b| b.date <= end);
        }
        if let Some(last) = bars.last() {
            let cutoff = last.date - Duration::days(window_days as i64);
            bars.retain(|b| b.date > cutoff);
        }
        if bars.len() < min_bars {
            return Err(SieveError::InsufficientHistory {
                symbol: symbol.to_string(),
                bars: bars.len(),
                minimum: min_bars,
            });
        }
        Ok(bars)
    }

    fn get_realtime_quotes(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Quote>, SieveError> {
        let mut quotes = HashMap::new();
        for symbol in symbols {
            // A symbol without a data file is absent from the map, per the
            // port contract.
            let Ok(bars) = self.read_bars(symbol) else {
                continue;
            };
            let Some(last) = bars.last() else { continue };
            let change_pct = match bars.len().checked_sub(2).map(|i| bars[i].close) {
                Some(prev) if prev > 0.0 => (last.close / prev - 1.0) * 100.0,
                _ => 0.0,
            };
            quotes.insert(
                symbol.clone(),
                Quote {
                    price: last.close,
                    change_pct,
                },
            );
        }
        Ok(quotes)
    }

    fn get_trade_days(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, SieveError> {
        let content = self.read_file("calendar.csv", "calendar")?;
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let mut days = Vec::new();
        for record in reader.deserialize::<CalendarRecord>() {
            let record = record.map_err(|e| SieveError::DataSource {
                context: "calendar".to_string(),
                reason: format!("CSV parse error: {e}"),
            })?;
            if (start..=end).contains(&record.date) {
                days.push(record.date);
            }
        }
        days.sort();
        Ok(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, CsvDataAdapter) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        fs::write(
            path.join("universe.csv"),
            "symbol,name,market_cap\n\
             600036,China Merchants Bank,1.2e12\n\
             000001,Ping An Bank,4.0e11\n",
        )
        .unwrap();
        fs::write(
            path.join("calendar.csv"),
            "date\n2024-01-15\n2024-01-16\n2024-01-17\n2024-01-18\n",
        )
        .unwrap();
        fs::write(
            path.join("600036.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-15,34.0,35.0,33.5,34.8,120000\n\
             2024-01-16,34.8,35.5,34.2,35.2,130000\n\
             2024-01-17,35.2,36.0,35.0,35.6,110000\n",
        )
        .unwrap();

        let adapter = CsvDataAdapter::new(path);
        (dir, adapter)
    }

    #[test]
    fn universe_maps_to_candidates() {
        let (_dir, adapter) = setup();
        let candidates = adapter.list_candidates(None).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].symbol, "600036");
        assert_eq!(candidates[0].display_name, "China Merchants Bank");
        assert!((candidates[0].market_cap - 1.2e12).abs() < 1.0);
    }

    #[test]
    fn history_is_ascending_and_windowed() {
        let (_dir, adapter) = setup();
        let bars = adapter.get_history("600036", 60, 1, None).unwrap();
        assert_eq!(bars.len(), 3);
        assert!(bars.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn history_respects_as_of() {
        let (_dir, adapter) = setup();
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        let bars = adapter.get_history("600036", 60, 1, Some(as_of)).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars.last().unwrap().date, as_of);
    }

    #[test]
    fn short_history_is_typed_error() {
        let (_dir, adapter) = setup();
        let err = adapter.get_history("600036", 60, 10, None).unwrap_err();
        assert!(matches!(
            err,
            SieveError::InsufficientHistory { bars: 3, minimum: 10, .. }
        ));
    }

    #[test]
    fn missing_symbol_is_data_source_error() {
        let (_dir, adapter) = setup();
        let err = adapter.get_history("999999", 60, 1, None).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn quotes_synthesized_from_last_closes() {
        let (_dir, adapter) = setup();
        let quotes = adapter
            .get_realtime_quotes(&["600036".to_string(), "999999".to_string()])
            .unwrap();
        assert_eq!(quotes.len(), 1);
        let quote = &quotes["600036"];
        assert!((quote.price - 35.6).abs() < 1e-9);
        assert!((quote.change_pct - (35.6 / 35.2 - 1.0) * 100.0).abs() < 1e-9);
    }

    #[test]
    fn trade_days_filtered_to_range() {
        let (_dir, adapter) = setup();
        let days = adapter
            .get_trade_days(
                NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 17).unwrap(),
            )
            .unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
    }
}
