//! CSV data source.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use smabot_core::error::DataError;
use smabot_core::types::Bar;

/// CSV record format.
///
/// Prices are read as text so they reach `Decimal` without a float detour.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "date", alias = "timestamp", alias = "Timestamp", alias = "time")]
    date: String,
    #[serde(alias = "Open", alias = "open")]
    open: String,
    #[serde(alias = "High", alias = "high")]
    high: String,
    #[serde(alias = "Low", alias = "low")]
    low: String,
    #[serde(alias = "Close", alias = "close")]
    close: String,
    #[serde(alias = "Volume", alias = "volume", alias = "tick_volume", default)]
    volume: Option<String>,
}

/// CSV data source for historical bars.
pub struct CsvDataSource {
    path: PathBuf,
}

impl CsvDataSource {
    /// Create a new CSV data source.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Load every bar in the file, oldest first.
    pub fn load_all(&self) -> Result<Vec<Bar>, DataError> {
        let file =
            std::fs::File::open(&self.path).map_err(|e| DataError::ParseError(e.to_string()))?;
        Self::from_reader(file)
    }

    /// Load bars from any CSV reader, oldest first.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Bar>, DataError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut bars = Vec::new();

        for result in reader.deserialize() {
            let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;

            let volume = match record.volume.as_deref() {
                Some(v) if !v.is_empty() => parse_price(v)?,
                _ => Decimal::ZERO,
            };

            bars.push(Bar::new(
                parse_timestamp(&record.date)?,
                parse_price(&record.open)?,
                parse_price(&record.high)?,
                parse_price(&record.low)?,
                parse_price(&record.close)?,
                volume,
            ));
        }

        bars.sort_by_key(|b| b.timestamp);

        Ok(bars)
    }
}

fn parse_price(raw: &str) -> Result<Decimal, DataError> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| DataError::ParseError(format!("Could not parse number: {}", raw)))
}

/// Parse the timestamp formats seen in terminal and vendor exports.
fn parse_timestamp(date_str: &str) -> Result<DateTime<Utc>, DataError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.with_timezone(&Utc));
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y.%m.%d %H:%M:%S",
        "%Y.%m.%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];
    for format in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc());
        }
    }

    for format in ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(date_str, format) {
            if let Some(dt) = d.and_hms_opt(0, 0, 0) {
                return Ok(dt.and_utc());
            }
        }
    }

    // Unix timestamp, milliseconds when longer than 10 digits
    if let Ok(ts) = date_str.parse::<i64>() {
        let parsed = if ts > 10_000_000_000 {
            Utc.timestamp_millis_opt(ts).single()
        } else {
            Utc.timestamp_opt(ts, 0).single()
        };
        if let Some(dt) = parsed {
            return Ok(dt);
        }
    }

    Err(DataError::ParseError(format!(
        "Could not parse date: {}",
        date_str
    )))
}
