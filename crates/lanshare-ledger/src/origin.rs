use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::document;
use crate::error::LedgerResult;

/// Persisted map from artifact name to uploader address.
///
/// The whole document is read, modified and rewritten on every `record`.
/// `write_lock` spans that read-modify-write, so concurrent writers in this
/// process never lose each other's entries. Entries are not tied to the
/// artifact's lifetime and may outlive it.
pub struct OriginLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

/// In-memory copy of the ledger document.
pub type OriginMap = BTreeMap<String, String>;

impl OriginLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Upsert `name → address` and persist the full document.
    pub fn record(&self, name: &str, address: &str) -> LedgerResult<()> {
        let _guard = self.write_lock.lock().expect("origin ledger lock poisoned");
        let mut map: OriginMap = document::load_or_reset(&self.path)?;
        map.insert(name.to_string(), address.to_string());
        document::save(&self.path, &map)?;
        debug!(name, address, path = %self.path.display(), "origin recorded");
        Ok(())
    }

    /// Address recorded for `name`, if any.
    pub fn lookup(&self, name: &str) -> LedgerResult<Option<String>> {
        let mut map = self.snapshot()?;
        Ok(map.remove(name))
    }

    /// Read the whole document once, for joining against a listing.
    pub fn snapshot(&self) -> LedgerResult<OriginMap> {
        document::load(&self.path)
    }
}

impl std::fmt::Debug for OriginLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OriginLedger")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn ledger() -> (tempfile::TempDir, OriginLedger) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = OriginLedger::new(dir.path().join("file_origins.json"));
        (dir, ledger)
    }

    #[test]
    fn lookup_on_missing_document_is_empty() {
        let (_dir, ledger) = ledger();
        assert_eq!(ledger.lookup("a.txt").unwrap(), None);
        assert!(ledger.snapshot().unwrap().is_empty());
    }

    #[test]
    fn record_then_lookup() {
        let (_dir, ledger) = ledger();
        ledger.record("a.txt", "10.0.0.2").unwrap();
        assert_eq!(ledger.lookup("a.txt").unwrap().as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn record_overwrites_existing_key() {
        let (_dir, ledger) = ledger();
        ledger.record("a.txt", "10.0.0.2").unwrap();
        ledger.record("a.txt", "10.0.0.3").unwrap();
        assert_eq!(ledger.lookup("a.txt").unwrap().as_deref(), Some("10.0.0.3"));
        assert_eq!(ledger.snapshot().unwrap().len(), 1);
    }

    #[test]
    fn document_survives_reopen() {
        let (dir, ledger) = ledger();
        ledger.record("clip.mp4", "10.0.0.4").unwrap();
        drop(ledger);

        let reopened = OriginLedger::new(dir.path().join("file_origins.json"));
        assert_eq!(reopened.lookup("clip.mp4").unwrap().as_deref(), Some("10.0.0.4"));
    }

    #[test]
    fn record_recovers_from_corrupt_document() {
        let (dir, ledger) = ledger();
        std::fs::write(ledger.path(), b"{\"a.txt\": ").unwrap();
        assert!(ledger.snapshot().is_err());

        ledger.record("b.txt", "10.0.0.9").unwrap();
        assert_eq!(ledger.lookup("b.txt").unwrap().as_deref(), Some("10.0.0.9"));
        assert!(dir.path().join("file_origins.json.corrupt").is_file());
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        let (_dir, ledger) = ledger();
        let ledger = Arc::new(ledger);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    ledger
                        .record(&format!("f{i}.txt"), &format!("10.0.0.{i}"))
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }

        assert_eq!(ledger.snapshot().unwrap().len(), 16);
    }
}
