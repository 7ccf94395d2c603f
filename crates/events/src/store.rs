//! JSONL journal store - append-only, hash-chained writer

use crate::error::EventError;
use crate::event::{JournalRecord, VaultEvent};
use crate::hash::{calculate_record_hash, GENESIS_HASH};
use crate::reader::JournalReader;
use crate::sink::EventSink;
use chrono::{DateTime, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-only JSONL journal, rotated daily.
///
/// Implements [`EventSink`]: every emitted event becomes one record
/// chained to its predecessor by hash.
#[derive(Debug)]
pub struct JournalStore {
    base_path: PathBuf,
    current_file: Option<BufWriter<File>>,
    current_date: Option<String>,
    last_sequence: u64,
    last_hash: String,
    failure: Option<EventError>,
}

impl JournalStore {
    /// Open (or create) a journal directory, resuming after its last record
    pub fn open(base_path: impl AsRef<Path>) -> Result<Self, EventError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        let (last_sequence, last_hash) = match JournalReader::from_directory(&base_path)?.last_record()? {
            Some(record) => (record.sequence, record.hash),
            None => (0, GENESIS_HASH.to_string()),
        };

        Ok(Self {
            base_path,
            current_file: None,
            current_date: None,
            last_sequence,
            last_hash,
            failure: None,
        })
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Append an event as the next record of the chain
    pub fn append(&mut self, event: &VaultEvent) -> Result<JournalRecord, EventError> {
        let record = Self::seal(self.last_sequence + 1, &self.last_hash, Utc::now(), event)?;
        self.write(std::slice::from_ref(&record))?;

        tracing::debug!(sequence = record.sequence, event = event.kind(), "Journal record appended");
        Ok(record)
    }

    /// Append several events as consecutive records, written and flushed
    /// together. Nothing is written if any record fails to serialize.
    pub fn append_batch(&mut self, events: &[VaultEvent]) -> Result<Vec<JournalRecord>, EventError> {
        let timestamp = Utc::now();
        let mut records: Vec<JournalRecord> = Vec::with_capacity(events.len());

        for event in events {
            let (sequence, prev_hash) = match records.last() {
                Some(last) => (last.sequence + 1, last.hash.as_str()),
                None => (self.last_sequence + 1, self.last_hash.as_str()),
            };
            let record = Self::seal(sequence, prev_hash, timestamp, event)?;
            records.push(record);
        }

        self.write(&records)?;

        tracing::debug!(count = records.len(), last_sequence = self.last_sequence, "Journal batch appended");
        Ok(records)
    }

    fn seal(
        sequence: u64,
        prev_hash: &str,
        timestamp: DateTime<Utc>,
        event: &VaultEvent,
    ) -> Result<JournalRecord, EventError> {
        let hash = calculate_record_hash(sequence, prev_hash, &timestamp, event)?;

        Ok(JournalRecord {
            sequence,
            prev_hash: prev_hash.to_string(),
            hash,
            timestamp,
            event: event.clone(),
        })
    }

    /// Write sealed records with a single flush, then advance the chain head
    fn write(&mut self, records: &[JournalRecord]) -> Result<(), EventError> {
        let (Some(first), Some(last)) = (records.first(), records.last()) else {
            return Ok(());
        };

        let mut buffer = String::new();
        for record in records {
            buffer.push_str(&serde_json::to_string(record)?);
            buffer.push('\n');
        }

        let date = first.timestamp.format("%Y-%m-%d").to_string();
        if self.current_date.as_ref() != Some(&date) {
            self.rotate_file(&date)?;
        }

        if let Some(ref mut writer) = self.current_file {
            writer.write_all(buffer.as_bytes())?;
            writer.flush()?;
        }

        self.last_sequence = last.sequence;
        self.last_hash = last.hash.clone();
        Ok(())
    }

    fn record_failure(&mut self, e: EventError) {
        // Keep the first failure; later ones are usually the same cause
        if self.failure.is_none() {
            self.failure = Some(e);
        }
    }

    /// First append failure since the last call, if any
    pub fn take_error(&mut self) -> Option<EventError> {
        self.failure.take()
    }

    fn rotate_file(&mut self, date: &str) -> Result<(), EventError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }

        let file_path = self.base_path.join(format!("{}.jsonl", date));
        let file = OpenOptions::new().create(true).append(true).open(&file_path)?;

        self.current_file = Some(BufWriter::new(file));
        self.current_date = Some(date.to_string());

        Ok(())
    }

    /// Flush and close the current file
    pub fn close(&mut self) -> Result<(), EventError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }
        self.current_file = None;
        self.current_date = None;
        Ok(())
    }
}

impl EventSink for JournalStore {
    fn name(&self) -> &str {
        "journal"
    }

    fn emit(&mut self, event: &VaultEvent) {
        if let Err(e) = self.append(event) {
            tracing::error!(error = %e, event = event.kind(), "Failed to append journal record");
            self.record_failure(e);
        }
    }

    fn emit_all(&mut self, events: &[VaultEvent]) {
        if let Err(e) = self.append_batch(events) {
            tracing::error!(error = %e, count = events.len(), "Failed to append journal batch");
            self.record_failure(e);
        }
    }
}

impl Drop for JournalStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::verify_chain;
    use custody_core::{Amount, Identity};
    use tempfile::TempDir;

    fn received(units: u64) -> VaultEvent {
        VaultEvent::ValueReceived {
            sender: Identity::from("bob"),
            amount: Amount::from_units(units),
        }
    }

    #[test]
    fn test_append_and_read_back() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let mut store = JournalStore::open(dir.path())?;

        store.append(&received(1))?;
        store.append(&received(2))?;

        let records = JournalReader::from_directory(dir.path())?.read_all()?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].prev_hash, GENESIS_HASH);
        assert_eq!(records[1].prev_hash, records[0].hash);
        assert_eq!(records[1].event, received(2));
        assert!(verify_chain(&records).is_ok());
        Ok(())
    }

    #[test]
    fn test_reopen_continues_chain() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        {
            let mut store = JournalStore::open(dir.path())?;
            store.emit(&received(1));
        }

        let mut store = JournalStore::open(dir.path())?;
        assert_eq!(store.last_sequence(), 1);
        store.emit(&received(2));
        assert!(store.take_error().is_none());

        let records = JournalReader::from_directory(dir.path())?.read_all()?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].sequence, 2);
        assert!(verify_chain(&records).is_ok());
        Ok(())
    }

    #[test]
    fn test_batch_is_one_chained_write() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let mut store = JournalStore::open(dir.path())?;
        store.append(&received(1))?;

        let batch = vec![
            VaultEvent::TransactionConfirmed {
                signer: Identity::from("bob"),
                index: 0,
            },
            VaultEvent::TransactionExecuted {
                signer: Identity::from("bob"),
                index: 0,
            },
        ];
        store.emit_all(&batch);
        assert!(store.take_error().is_none());
        assert_eq!(store.last_sequence(), 3);

        let records = JournalReader::from_directory(dir.path())?.read_all()?;
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].event, batch[0]);
        assert_eq!(records[2].event, batch[1]);
        assert_eq!(records[1].timestamp, records[2].timestamp);
        assert!(verify_chain(&records).is_ok());
        Ok(())
    }

    #[test]
    fn test_empty_batch_writes_nothing() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let mut store = JournalStore::open(dir.path())?;

        assert!(store.append_batch(&[])?.is_empty());
        assert_eq!(store.last_sequence(), 0);
        assert_eq!(JournalReader::from_directory(dir.path())?.files().len(), 0);
        Ok(())
    }

    #[test]
    fn test_corrupt_line_reports_location() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("2026-01-01.jsonl"), "{not json}\n")?;

        let result = JournalReader::from_directory(dir.path())?.read_all();
        assert!(matches!(result, Err(EventError::InvalidRecord { line: 1, .. })));
        Ok(())
    }

    #[test]
    fn test_missing_directory_is_empty() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let reader = JournalReader::from_directory(dir.path().join("absent"))?;
        assert_eq!(reader.count()?, 0);
        assert!(reader.last_record()?.is_none());
        Ok(())
    }
}
