use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use lanshare_types::{Capacity, Message};

use crate::address::normalize_origin;
use crate::document;
use crate::error::LedgerResult;

/// The "latest message" projection, stored beside the history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct CurrentMessage {
    text: String,
}

/// Capacity-bounded, chronologically ordered message history.
///
/// `append` keeps only the newest `capacity` entries. It also overwrites the
/// single current-message document, which is a convenience copy of the most
/// recent text and not a second source of truth.
pub struct HistoryLog {
    history_path: PathBuf,
    current_path: PathBuf,
    capacity: Capacity,
    write_lock: Mutex<()>,
}

impl HistoryLog {
    pub fn new(
        history_path: impl Into<PathBuf>,
        current_path: impl Into<PathBuf>,
        capacity: Capacity,
    ) -> Self {
        Self {
            history_path: history_path.into(),
            current_path: current_path.into(),
            capacity,
            write_lock: Mutex::new(()),
        }
    }

    pub fn capacity(&self) -> &Capacity {
        &self.capacity
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    /// Append a message from `raw_address` and persist both documents.
    pub fn append(&self, text: &str, raw_address: &str) -> LedgerResult<Message> {
        let message = Message::now(text, normalize_origin(raw_address));
        let limit = self.capacity.get();

        let _guard = self.write_lock.lock().expect("history lock poisoned");
        let mut entries: Vec<Message> = document::load_or_reset(&self.history_path)?;
        entries.push(message.clone());
        if entries.len() > limit {
            let excess = entries.len() - limit;
            entries.drain(..excess);
        }
        document::save(&self.history_path, &entries)?;
        // The message is stored once the history is saved. The current-message
        // copy is derived, so failing to refresh it must not fail the append.
        let current = CurrentMessage {
            text: message.text.clone(),
        };
        if let Err(e) = document::save(&self.current_path, &current) {
            warn!(
                path = %self.current_path.display(),
                error = %e,
                "failed to refresh current message"
            );
        }

        debug!(retained = entries.len(), limit, "message appended");
        Ok(message)
    }

    /// All retained messages, oldest first.
    pub fn read_all(&self) -> LedgerResult<Vec<Message>> {
        document::load(&self.history_path)
    }

    /// Text of the most recent append, or empty if none.
    pub fn current_text(&self) -> LedgerResult<String> {
        let current: CurrentMessage = document::load(&self.current_path)?;
        Ok(current.text)
    }
}

impl std::fmt::Debug for HistoryLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryLog")
            .field("history_path", &self.history_path)
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(capacity: i64) -> (tempfile::TempDir, HistoryLog) {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(
            dir.path().join("message_history.json"),
            dir.path().join("message.json"),
            Capacity::new(capacity).unwrap(),
        );
        (dir, log)
    }

    // -----------------------------------------------------------------------
    // Empty state
    // -----------------------------------------------------------------------

    #[test]
    fn empty_log_reads_empty() {
        let (_dir, log) = log(20);
        assert!(log.read_all().unwrap().is_empty());
        assert_eq!(log.current_text().unwrap(), "");
    }

    // -----------------------------------------------------------------------
    // Append / truncation
    // -----------------------------------------------------------------------

    #[test]
    fn append_updates_history_and_current() {
        let (_dir, log) = log(20);
        let msg = log.append("hello", "10.0.0.8").unwrap();
        assert_eq!(msg.address, "10.0.0.8");

        let all = log.read_all().unwrap();
        assert_eq!(all, vec![msg]);
        assert_eq!(log.current_text().unwrap(), "hello");
    }

    #[test]
    fn keeps_newest_entries_in_order() {
        let (_dir, log) = log(20);
        for i in 1..=21 {
            log.append(&format!("message #{i}"), "10.0.0.1").unwrap();
        }
        let all = log.read_all().unwrap();
        assert_eq!(all.len(), 20);
        assert_eq!(all[0].text, "message #2");
        assert_eq!(all[19].text, "message #21");
        assert_eq!(log.current_text().unwrap(), "message #21");
    }

    #[test]
    fn append_at_capacity_drops_exactly_one() {
        let (_dir, log) = log(3);
        for text in ["a", "b", "c"] {
            log.append(text, "10.0.0.1").unwrap();
        }
        log.append("d", "10.0.0.1").unwrap();
        let texts: Vec<_> = log.read_all().unwrap().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["b", "c", "d"]);
    }

    #[test]
    fn lowered_capacity_applies_on_next_append() {
        let (_dir, log) = log(10);
        for i in 0..6 {
            log.append(&i.to_string(), "10.0.0.1").unwrap();
        }
        log.capacity().set(2).unwrap();
        assert_eq!(log.read_all().unwrap().len(), 6);

        log.append("last", "10.0.0.1").unwrap();
        let texts: Vec<_> = log.read_all().unwrap().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["5", "last"]);
    }

    #[test]
    fn address_is_normalized() {
        let (_dir, log) = log(5);
        let msg = log.append("via proxy", "10.1.1.1, 10.2.2.2").unwrap();
        assert_eq!(msg.address, "10.1.1.1");
    }

    // -----------------------------------------------------------------------
    // Failure handling
    // -----------------------------------------------------------------------

    #[test]
    fn append_recovers_from_corrupt_history() {
        let (dir, log) = log(5);
        let path = dir.path().join("message_history.json");
        std::fs::write(&path, b"[{\"text\": ").unwrap();
        assert!(log.read_all().is_err());

        log.append("fresh start", "10.0.0.1").unwrap();
        let texts: Vec<_> = log.read_all().unwrap().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["fresh start"]);
        assert!(dir.path().join("message_history.json.corrupt").is_file());
    }

    #[test]
    fn append_is_stored_when_current_copy_fails() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the current-message document should be.
        let blocked = dir.path().join("message.json");
        std::fs::create_dir(&blocked).unwrap();
        let log = HistoryLog::new(
            dir.path().join("message_history.json"),
            blocked.clone(),
            Capacity::new(5).unwrap(),
        );

        log.append("kept", "10.0.0.1").unwrap();
        assert_eq!(log.read_all().unwrap().len(), 1);
    }

    #[test]
    fn timestamps_are_chronological() {
        let (_dir, log) = log(5);
        log.append("first", "10.0.0.1").unwrap();
        log.append("second", "10.0.0.1").unwrap();
        let all = log.read_all().unwrap();
        assert!(all[0].timestamp <= all[1].timestamp);
    }
}
