//! OHLCV bar window and file ingestion

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// A single OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Midpoint of the bar's range
    pub fn mid(&self) -> f64 {
        (self.high + self.low) / 2.0
    }
}

/// CSV row structure: `timestamp,open,high,low,close,volume`
#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Parse an RFC 3339 timestamp or integer epoch milliseconds
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return Utc
            .timestamp_millis_opt(ms)
            .single()
            .with_context(|| format!("Epoch milliseconds out of range: {}", ms));
    }
    let ts = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Failed to parse timestamp: {}", raw))?
        .with_timezone(&Utc);
    Ok(ts)
}

/// Read bars from any CSV source
pub fn read_bars<R: Read>(reader: R) -> Result<Vec<Bar>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut bars = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result.with_context(|| "Failed to parse CSV row")?;
        bars.push(Bar {
            timestamp: parse_timestamp(&row.timestamp)?,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    if bars.windows(2).any(|w| w[1].timestamp < w[0].timestamp) {
        warn!("Bars out of order, sorting {} bars by timestamp", bars.len());
        bars.sort_by_key(|b| b.timestamp);
    }

    Ok(bars)
}

/// Load a bar window from a `.csv` or zstd-compressed `.csv.zst` file
pub fn load_bars(path: &Path) -> Result<Vec<Bar>> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;

    let bars = if path.extension().map_or(false, |ext| ext == "zst") {
        let decoder = zstd::stream::Decoder::new(file)
            .with_context(|| format!("Failed to create zstd decoder for: {:?}", path))?;
        read_bars(BufReader::new(decoder))?
    } else {
        read_bars(BufReader::new(file))?
    };

    debug!("Loaded {} bars from {:?}", bars.len(), path);
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "timestamp,open,high,low,close,volume\n\
        2025-01-03T00:00:00Z,3400.0,3410.5,3395.0,3405.0,1200.5\n\
        2025-01-03T01:00:00Z,3405.0,3420.0,3401.0,3418.0,980.0\n";

    #[test]
    fn test_read_bars_rfc3339() {
        let bars = read_bars(SAMPLE.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].high, 3410.5);
        assert_eq!(bars[1].close, 3418.0);
        assert_eq!(bars[0].mid(), (3410.5 + 3395.0) / 2.0);
    }

    #[test]
    fn test_read_bars_epoch_millis_sorted() {
        let csv = "timestamp,open,high,low,close,volume\n\
            1735866000000,2,3,1,2,10\n\
            1735862400000,1,2,0.5,1.5,10\n";
        let bars = read_bars(csv.as_bytes()).unwrap();
        assert!(bars[0].timestamp < bars[1].timestamp);
        assert_eq!(bars[0].close, 1.5);
    }

    #[test]
    fn test_read_bars_bad_timestamp() {
        let csv = "timestamp,open,high,low,close,volume\nyesterday,1,1,1,1,1\n";
        assert!(read_bars(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_load_plain_and_zst() {
        let dir = tempfile::tempdir().unwrap();

        let plain = dir.path().join("bars.csv");
        std::fs::write(&plain, SAMPLE).unwrap();
        assert_eq!(load_bars(&plain).unwrap().len(), 2);

        let compressed = dir.path().join("bars.csv.zst");
        let mut encoder = zstd::stream::Encoder::new(File::create(&compressed).unwrap(), 3).unwrap();
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        encoder.finish().unwrap();
        let bars = load_bars(&compressed).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].volume, 980.0);
    }
}
