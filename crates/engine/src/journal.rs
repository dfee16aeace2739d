use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::PathBuf;

use tracing::debug;

use common::{Result, TradeJournal, TradeRecord};

/// Trade journal stored as JSON Lines: one `TradeRecord` object per line,
/// appended in ledger order.
#[derive(Debug, Clone)]
pub struct JsonLinesJournal {
    path: PathBuf,
}

impl JsonLinesJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read every record back. A missing file is an empty journal.
    pub fn load(&self) -> Result<Vec<TradeRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

impl TradeJournal for JsonLinesJournal {
    fn append(&mut self, records: &[TradeRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = BufWriter::new(file);
        for record in records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        debug!(path = %self.path.display(), written = records.len(), "Journal appended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use common::{OrderSide, OrderType, TradeLedger};

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("trendbot-journal-{}", uuid::Uuid::new_v4()))
            .join("historical_actions.jsonl")
    }

    fn record(secs: i64, action: OrderSide) -> TradeRecord {
        TradeRecord {
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            action,
            order_type: OrderType::Market,
            amount: 0.5,
            entry_price: 1_200_000.0,
            stop_loss: 1_190_000.0,
            take_profit: 1_215_000.0,
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        assert!(JsonLinesJournal::new(temp_path()).load().unwrap().is_empty());
    }

    #[test]
    fn appends_accumulate_in_order() {
        let path = temp_path();
        let mut journal = JsonLinesJournal::new(&path);
        journal.append(&[record(1, OrderSide::Buy)]).unwrap();
        journal
            .append(&[record(2, OrderSide::Sell), record(3, OrderSide::Buy)])
            .unwrap();

        let loaded = journal.load().unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0], record(1, OrderSide::Buy));
        assert_eq!(loaded[1].action, OrderSide::Sell);
        assert_eq!(loaded[2].timestamp, Utc.timestamp_opt(3, 0).unwrap());

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn ledger_flush_writes_each_record_once() {
        let path = temp_path();
        let mut journal = JsonLinesJournal::new(&path);
        let mut ledger = TradeLedger::new();

        ledger.append(record(1, OrderSide::Buy));
        assert_eq!(ledger.flush(&mut journal).unwrap(), 1);
        ledger.append(record(2, OrderSide::Buy));
        assert_eq!(ledger.flush(&mut journal).unwrap(), 1);
        assert_eq!(ledger.flush(&mut journal).unwrap(), 0);

        assert_eq!(journal.load().unwrap(), ledger.snapshot());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
