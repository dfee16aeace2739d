use tracing::debug;

use crate::{Result, TradeRecord};

/// Persistence collaborator for the trade ledger.
pub trait TradeJournal: Send {
    /// Durably append `records`, in order, after everything written before.
    fn append(&mut self, records: &[TradeRecord]) -> Result<()>;
}

/// Append-only, in-memory record of trades. Insertion order is temporal order.
#[derive(Debug, Clone, Default)]
pub struct TradeLedger {
    records: Vec<TradeRecord>,
    /// Number of leading records already handed to a journal.
    persisted: usize,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: TradeRecord) {
        debug!(
            action = %record.action,
            amount = record.amount,
            entry_price = record.entry_price,
            "Trade appended to ledger"
        );
        self.records.push(record);
    }

    /// Full ordered copy of every record.
    pub fn snapshot(&self) -> Vec<TradeRecord> {
        self.records.clone()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<TradeRecord> {
        self.records
    }

    /// Hand every record not yet persisted to `journal`. Returns how many were
    /// written. A failed write leaves them pending for the next flush.
    pub fn flush(&mut self, journal: &mut dyn TradeJournal) -> Result<usize> {
        let pending = &self.records[self.persisted..];
        if pending.is_empty() {
            return Ok(0);
        }
        journal.append(pending)?;
        let written = pending.len();
        self.persisted = self.records.len();
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, OrderSide, OrderType};
    use chrono::{TimeZone, Utc};

    fn record(secs: i64, action: OrderSide) -> TradeRecord {
        TradeRecord {
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            action,
            order_type: OrderType::Market,
            amount: 1.0,
            entry_price: 100.0,
            stop_loss: 97.0,
            take_profit: 104.0,
        }
    }

    #[derive(Default)]
    struct VecJournal {
        written: Vec<TradeRecord>,
        fail: bool,
    }

    impl TradeJournal for VecJournal {
        fn append(&mut self, records: &[TradeRecord]) -> Result<()> {
            if self.fail {
                return Err(Error::Other("disk full".into()));
            }
            self.written.extend_from_slice(records);
            Ok(())
        }
    }

    #[test]
    fn snapshot_preserves_insertion_order() {
        let mut ledger = TradeLedger::new();
        ledger.append(record(3, OrderSide::Buy));
        ledger.append(record(1, OrderSide::Sell));
        ledger.append(record(2, OrderSide::Buy));

        let times: Vec<i64> = ledger.snapshot().iter().map(|r| r.timestamp.timestamp()).collect();
        assert_eq!(times, vec![3, 1, 2]);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let mut ledger = TradeLedger::new();
        ledger.append(record(1, OrderSide::Buy));
        let snap = ledger.snapshot();
        ledger.append(record(2, OrderSide::Buy));
        assert_eq!(snap.len(), 1);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn flush_writes_only_new_records() {
        let mut ledger = TradeLedger::new();
        let mut journal = VecJournal::default();

        ledger.append(record(1, OrderSide::Buy));
        ledger.append(record(2, OrderSide::Buy));
        assert_eq!(ledger.flush(&mut journal).unwrap(), 2);
        assert_eq!(ledger.flush(&mut journal).unwrap(), 0);

        ledger.append(record(3, OrderSide::Sell));
        assert_eq!(ledger.flush(&mut journal).unwrap(), 1);
        assert_eq!(journal.written, ledger.snapshot());
    }

    #[test]
    fn failed_flush_is_retried() {
        let mut ledger = TradeLedger::new();
        let mut journal = VecJournal {
            fail: true,
            ..Default::default()
        };
        ledger.append(record(1, OrderSide::Buy));
        assert!(ledger.flush(&mut journal).is_err());

        journal.fail = false;
        assert_eq!(ledger.flush(&mut journal).unwrap(), 1);
        assert_eq!(journal.written.len(), 1);
    }
}
