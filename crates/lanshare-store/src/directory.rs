use std::cmp::Ordering;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use tracing::{debug, info, warn};

use lanshare_ledger::{normalize_origin, OriginLedger, OriginMap};
use lanshare_types::{Artifact, Capacity, StoreKind};

use crate::error::{StoreError, StoreResult};
use crate::naming::{self, is_safe_name};
use crate::policy::StorePolicy;
use crate::traits::{ArtifactStore, Retrieved, Upload};

/// Upper bound on collision suffixes tried for one candidate name.
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// A store backed by one flat directory.
///
/// Name reservation uses `create_new`, so two concurrent ingestions can never
/// both claim the same final name. Reserved names stay in `in_flight` until
/// their content is written; listings and the eviction sweep ignore them.
/// The sweep is serialized by `sweep_lock`; content writes hold no lock.
pub struct DirectoryStore {
    kind: StoreKind,
    root: PathBuf,
    policy: StorePolicy,
    capacity: Capacity,
    origins: OriginLedger,
    in_flight: Mutex<HashSet<String>>,
    sweep_lock: Mutex<()>,
}

/// A claimed name whose content is still being written. Dropping it makes
/// the artifact visible to listings and eviction.
struct Reservation<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    name: String,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.name);
    }
}

impl DirectoryStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(
        kind: StoreKind,
        root: impl Into<PathBuf>,
        policy: StorePolicy,
        capacity: Capacity,
        origins: OriginLedger,
    ) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(store = %kind, root = %root.display(), "store opened");
        Ok(Self {
            kind,
            root,
            policy,
            capacity,
            origins,
            in_flight: Mutex::new(HashSet::new()),
            sweep_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn policy(&self) -> &StorePolicy {
        &self.policy
    }

    pub fn origins(&self) -> &OriginLedger {
        &self.origins
    }

    fn path_for(&self, name: &str) -> StoreResult<PathBuf> {
        if !is_safe_name(name) {
            return Err(StoreError::NotFound(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    /// Atomically claim the first free name among `base`, `base_1`, ...
    ///
    /// The in-flight set is held across the create, so a concurrent sweep
    /// never sees the new file without also seeing its reservation.
    fn reserve(&self, base: &str) -> StoreResult<(Reservation<'_>, File)> {
        let mut in_flight = self.in_flight.lock().expect("in-flight lock poisoned");
        for n in 0..MAX_NAME_ATTEMPTS {
            let name = if n == 0 {
                base.to_string()
            } else {
                naming::with_suffix(base, n)
            };
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.root.join(&name))
            {
                Ok(file) => {
                    in_flight.insert(name.clone());
                    let reservation = Reservation {
                        in_flight: &self.in_flight,
                        name,
                    };
                    return Ok((reservation, file));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free name for {base} after {MAX_NAME_ATTEMPTS} attempts"),
        )
        .into())
    }

    /// Directory entries without origin information, in enumeration order.
    fn scan(&self) -> StoreResult<Vec<Artifact>> {
        let mut artifacts = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    warn!(store = %self.kind, name = ?raw, "skipping non UTF-8 entry");
                    continue;
                }
            };
            if name.starts_with('.') {
                continue;
            }
            let meta = match entry.metadata() {
                Ok(meta) => meta,
                // Removed between read_dir and stat.
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !meta.is_file() {
                continue;
            }
            artifacts.push(Artifact {
                name,
                size_bytes: meta.len(),
                modified_at: meta.modified()?,
                origin_address: None,
            });
        }
        Ok(artifacts)
    }

    fn origin_snapshot(&self) -> OriginMap {
        self.origins.snapshot().unwrap_or_else(|e| {
            warn!(
                store = %self.kind,
                error = %e,
                "origin ledger unreadable; listing without origins"
            );
            OriginMap::new()
        })
    }

    /// Stream `content` into the reserved file. Returns the byte count and
    /// the modification time read from the still-open handle.
    fn write_content(
        &self,
        file: File,
        content: &mut dyn Read,
    ) -> StoreResult<(u64, SystemTime)> {
        let limit = self.policy.max_size();
        let mut writer = BufWriter::new(file);
        let written = io::copy(&mut content.take(limit.saturating_add(1)), &mut writer)?;
        if written > limit {
            return Err(StoreError::TooLarge {
                size: written,
                limit,
            });
        }
        writer.flush()?;
        let modified_at = writer.get_ref().metadata()?.modified()?;
        Ok((written, modified_at))
    }

    /// Remove a partially written artifact after a failed write.
    fn discard(&self, name: &str) {
        match fs::remove_file(self.root.join(name)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                store = %self.kind,
                name = %name,
                error = %e,
                "failed to remove partial artifact"
            ),
        }
    }
}

fn oldest_first(a: &Artifact, b: &Artifact) -> Ordering {
    a.modified_at
        .cmp(&b.modified_at)
        .then_with(|| a.name.cmp(&b.name))
}

impl ArtifactStore for DirectoryStore {
    fn kind(&self) -> StoreKind {
        self.kind
    }

    fn capacity(&self) -> &Capacity {
        &self.capacity
    }

    fn ingest(&self, upload: Upload<'_>) -> StoreResult<Artifact> {
        let content = upload
            .content
            .ok_or(StoreError::MissingInput("no file provided"))?;
        let candidate = upload
            .candidate_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(StoreError::MissingInput("no file name provided"))?;
        let ext = self.policy.check_extension(candidate)?;
        self.policy.check_size(upload.byte_size)?;

        let base = naming::sanitize(candidate, ext);
        let (reservation, file) = self.reserve(&base)?;
        let name = reservation.name.clone();
        let (size_bytes, modified_at) = match self.write_content(file, content) {
            Ok(written) => written,
            Err(e) => {
                warn!(store = %self.kind, name = %name, error = %e, "artifact write failed");
                self.discard(&name);
                return Err(e);
            }
        };
        drop(reservation);

        let address = normalize_origin(upload.origin);
        if let Err(e) = self.origins.record(&name, &address) {
            warn!(store = %self.kind, name = %name, error = %e, "failed to record origin");
        }

        let evicted = match self.evict() {
            Ok(evicted) => evicted,
            Err(e) => {
                warn!(store = %self.kind, error = %e, "eviction sweep failed");
                Vec::new()
            }
        };

        info!(
            store = %self.kind,
            name = %name,
            size = size_bytes,
            origin = %address,
            evicted = evicted.len(),
            "artifact ingested"
        );
        Ok(Artifact {
            name,
            size_bytes,
            modified_at,
            origin_address: Some(address),
        })
    }

    fn list(&self) -> StoreResult<Vec<Artifact>> {
        let mut artifacts = self.scan()?;
        {
            let in_flight = self.in_flight.lock().expect("in-flight lock poisoned");
            artifacts.retain(|a| !in_flight.contains(&a.name));
        }
        let mut origins = self.origin_snapshot();
        for artifact in &mut artifacts {
            artifact.origin_address = origins.remove(&artifact.name);
        }
        artifacts.sort_by(|a, b| oldest_first(b, a));
        Ok(artifacts)
    }

    fn retrieve(&self, name: &str) -> StoreResult<Retrieved> {
        let path = self.path_for(name)?;
        let not_found = || StoreError::NotFound(name.to_string());
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(not_found());
        }
        let origin_address = self.origins.lookup(name).unwrap_or_else(|e| {
            warn!(store = %self.kind, name, error = %e, "origin lookup failed");
            None
        });
        Ok(Retrieved {
            artifact: Artifact {
                name: name.to_string(),
                size_bytes: meta.len(),
                modified_at: meta.modified()?,
                origin_address,
            },
            file,
        })
    }

    fn delete(&self, name: &str) -> StoreResult<()> {
        let path = self.path_for(name)?;
        match fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(StoreError::NotFound(name.to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(store = %self.kind, name, "artifact deleted");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn evict(&self) -> StoreResult<Vec<String>> {
        let _guard = self.sweep_lock.lock().expect("sweep lock poisoned");
        // Held for the whole sweep so no name is reserved mid-scan.
        let in_flight = self.in_flight.lock().expect("in-flight lock poisoned");
        let limit = self.capacity.get();
        let mut artifacts = self.scan()?;
        artifacts.retain(|a| !in_flight.contains(&a.name));
        if artifacts.len() <= limit {
            return Ok(Vec::new());
        }

        artifacts.sort_by(oldest_first);
        let excess = artifacts.len() - limit;
        let mut removed = Vec::with_capacity(excess);
        for artifact in artifacts.into_iter().take(excess) {
            match fs::remove_file(self.root.join(&artifact.name)) {
                Ok(()) => removed.push(artifact.name),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        info!(store = %self.kind, limit, removed = ?removed, "eviction sweep");
        Ok(removed)
    }
}

impl std::fmt::Debug for DirectoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryStore")
            .field("kind", &self.kind)
            .field("root", &self.root)
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, SystemTime};

    fn open_store(dir: &Path, capacity: i64) -> DirectoryStore {
        DirectoryStore::open(
            StoreKind::File,
            dir.join("uploads"),
            StorePolicy::new(["txt", "png", "md"], 64),
            Capacity::new(capacity).unwrap(),
            OriginLedger::new(dir.join("file_origins.json")),
        )
        .unwrap()
    }

    fn put(store: &DirectoryStore, name: &str, data: &[u8]) -> StoreResult<Artifact> {
        let mut cursor = Cursor::new(data.to_vec());
        store.ingest(Upload {
            candidate_name: Some(name),
            byte_size: data.len() as u64,
            content: Some(&mut cursor),
            origin: "10.0.0.5",
        })
    }

    fn set_mtime(store: &DirectoryStore, name: &str, secs: u64) {
        let file = OpenOptions::new()
            .write(true)
            .open(store.root().join(name))
            .unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    fn names(store: &DirectoryStore) -> Vec<String> {
        let mut names: Vec<_> = store.list().unwrap().into_iter().map(|a| a.name).collect();
        names.sort();
        names
    }

    fn entry_count(store: &DirectoryStore) -> usize {
        fs::read_dir(store.root()).unwrap().count()
    }

    /// Blocks on its first read until told to resume, then yields `data`.
    struct PausingReader {
        data: Cursor<Vec<u8>>,
        started: Option<mpsc::Sender<()>>,
        resume: mpsc::Receiver<()>,
    }

    impl Read for PausingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if let Some(started) = self.started.take() {
                started.send(()).unwrap();
                self.resume.recv().unwrap();
            }
            self.data.read(buf)
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    #[test]
    fn rejects_missing_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 10);
        let result = store.ingest(Upload {
            candidate_name: Some("a.txt"),
            byte_size: 0,
            content: None,
            origin: "10.0.0.5",
        });
        assert!(matches!(result, Err(StoreError::MissingInput(_))));
    }

    #[test]
    fn rejects_blank_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 10);
        assert!(matches!(put(&store, "  ", b"x"), Err(StoreError::MissingInput(_))));
        assert_eq!(entry_count(&store), 0);
    }

    #[test]
    fn rejects_disallowed_extension_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 10);
        let err = put(&store, "setup.exe", b"MZ").unwrap_err();
        assert_eq!(err.kind(), lanshare_types::ErrorKind::InvalidType);
        assert_eq!(entry_count(&store), 0);
        assert!(store.origins().snapshot().unwrap().is_empty());
    }

    #[test]
    fn rejects_declared_size_over_ceiling() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 10);
        let err = put(&store, "big.txt", &[b'x'; 65]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::TooLarge {
                size: 65,
                limit: 64
            }
        ));
        assert_eq!(entry_count(&store), 0);
    }

    #[test]
    fn rejects_stream_longer_than_declared() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 10);
        let mut cursor = Cursor::new(vec![b'x'; 100]);
        let err = store
            .ingest(Upload {
                candidate_name: Some("sneaky.txt"),
                byte_size: 1,
                content: Some(&mut cursor),
                origin: "10.0.0.5",
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::TooLarge { .. }));
        assert_eq!(entry_count(&store), 0);
    }

    // -----------------------------------------------------------------------
    // Naming
    // -----------------------------------------------------------------------

    #[test]
    fn ingest_records_size_and_origin() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 10);
        let artifact = put(&store, "report.txt", b"hello").unwrap();
        assert_eq!(artifact.name, "report.txt");
        assert_eq!(artifact.size_bytes, 5);
        assert_eq!(artifact.origin_address.as_deref(), Some("10.0.0.5"));
        assert_eq!(
            store.origins().lookup("report.txt").unwrap().as_deref(),
            Some("10.0.0.5")
        );
    }

    #[test]
    fn duplicate_name_gets_suffix_and_original_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 10);
        put(&store, "report.txt", b"first").unwrap();
        let second = put(&store, "report.txt", b"second").unwrap();
        assert_eq!(second.name, "report_1.txt");

        let third = put(&store, "report.txt", b"third").unwrap();
        assert_eq!(third.name, "report_2.txt");

        assert_eq!(fs::read(store.root().join("report.txt")).unwrap(), b"first");
        assert_eq!(names(&store), vec!["report.txt", "report_1.txt", "report_2.txt"]);
    }

    #[test]
    fn candidate_is_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 10);
        let artifact = put(&store, "../../my notes.md", b"# hi").unwrap();
        assert_eq!(artifact.name, "my_notes.md");
        assert!(store.root().join("my_notes.md").is_file());
    }

    #[test]
    fn concurrent_same_name_ingests_get_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(open_store(dir.path(), 100));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || put(&store, "same.txt", format!("{i}").as_bytes()).unwrap())
            })
            .collect();
        let mut got: Vec<String> = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic").name)
            .collect();
        got.sort();
        got.dedup();
        assert_eq!(got.len(), 8);
        assert_eq!(store.list().unwrap().len(), 8);
    }

    // -----------------------------------------------------------------------
    // Listing / retrieve / delete
    // -----------------------------------------------------------------------

    #[test]
    fn list_is_newest_first_with_origins() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 10);
        put(&store, "a.txt", b"a").unwrap();
        put(&store, "b.txt", b"b").unwrap();
        put(&store, "c.txt", b"c").unwrap();
        set_mtime(&store, "a.txt", 30);
        set_mtime(&store, "b.txt", 10);
        set_mtime(&store, "c.txt", 20);

        let listed = store.list().unwrap();
        let order: Vec<_> = listed.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(order, vec!["a.txt", "c.txt", "b.txt"]);
        assert!(listed.iter().all(|a| a.origin_address.as_deref() == Some("10.0.0.5")));
    }

    #[test]
    fn list_without_ledger_entry_has_no_origin() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 10);
        fs::write(store.root().join("dropped.txt"), b"manual").unwrap();
        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].origin_address, None);
    }

    #[test]
    fn list_survives_corrupt_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 10);
        put(&store, "a.txt", b"a").unwrap();
        fs::write(dir.path().join("file_origins.json"), b"[broken").unwrap();
        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].origin_address, None);
    }

    #[test]
    fn ingest_succeeds_when_ledger_write_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::open(
            StoreKind::File,
            dir.path().join("uploads"),
            StorePolicy::new(["txt"], 64),
            Capacity::new(10).unwrap(),
            // A directory where the document should be: every record fails.
            OriginLedger::new(dir.path().join("uploads")),
        )
        .unwrap();
        let artifact = put(&store, "a.txt", b"a").unwrap();
        assert_eq!(artifact.name, "a.txt");
        assert!(store.root().join("a.txt").is_file());
    }

    #[test]
    fn retrieve_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 10);
        put(&store, "a.txt", b"payload").unwrap();

        let mut retrieved = store.retrieve("a.txt").unwrap();
        let mut buf = String::new();
        retrieved.file.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "payload");
        assert_eq!(retrieved.artifact.size_bytes, 7);
        assert_eq!(retrieved.artifact.origin_address.as_deref(), Some("10.0.0.5"));
    }

    #[test]
    fn retrieve_missing_or_unsafe_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 10);
        fs::write(dir.path().join("secret.txt"), b"outside").unwrap();
        assert!(matches!(store.retrieve("nope.txt"), Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.retrieve("../secret.txt"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn delete_removes_file_but_keeps_origin() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 10);
        put(&store, "a.txt", b"a").unwrap();
        store.delete("a.txt").unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(store.origins().lookup("a.txt").unwrap().is_some());
        assert!(matches!(store.delete("a.txt"), Err(StoreError::NotFound(_))));
    }

    // -----------------------------------------------------------------------
    // Eviction
    // -----------------------------------------------------------------------

    #[test]
    fn ingest_over_capacity_evicts_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 2);
        put(&store, "a.txt", b"a").unwrap();
        put(&store, "b.txt", b"b").unwrap();
        set_mtime(&store, "a.txt", 1);
        set_mtime(&store, "b.txt", 2);

        put(&store, "c.txt", b"c").unwrap();
        assert_eq!(names(&store), vec!["b.txt", "c.txt"]);
        // Eviction leaves the origin entry behind.
        assert!(store.origins().lookup("a.txt").unwrap().is_some());
    }

    #[test]
    fn lowered_capacity_evicts_several_oldest_on_next_ingest() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 10);
        for (i, name) in ["a.txt", "b.txt", "c.txt", "d.txt", "e.txt"].iter().enumerate() {
            put(&store, name, b"x").unwrap();
            set_mtime(&store, name, 100 - i as u64 * 10);
        }
        // Oldest is e.txt (60), newest a.txt (100).
        store.capacity().set(3).unwrap();
        put(&store, "f.txt", b"x").unwrap();

        assert_eq!(names(&store), vec!["a.txt", "b.txt", "f.txt"]);
    }

    #[test]
    fn evict_under_capacity_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 5);
        put(&store, "a.txt", b"a").unwrap();
        assert!(store.evict().unwrap().is_empty());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn explicit_evict_reports_removed_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 5);
        for (i, name) in ["a.txt", "b.txt", "c.txt"].iter().enumerate() {
            put(&store, name, b"x").unwrap();
            set_mtime(&store, name, i as u64 + 1);
        }
        store.capacity().set(1).unwrap();
        assert_eq!(store.evict().unwrap(), vec!["a.txt", "b.txt"]);
        assert_eq!(names(&store), vec!["c.txt"]);
    }

    #[test]
    fn count_never_exceeds_capacity_after_ingest() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 3);
        for i in 0..10 {
            put(&store, &format!("f{i}.txt"), b"x").unwrap();
            assert!(store.list().unwrap().len() <= 3);
        }
    }

    #[test]
    fn in_flight_upload_is_hidden_and_never_evicted() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(open_store(dir.path(), 1));
        let (started_tx, started_rx) = mpsc::channel();
        let (resume_tx, resume_rx) = mpsc::channel();

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut reader = PausingReader {
                    data: Cursor::new(b"slow".to_vec()),
                    started: Some(started_tx),
                    resume: resume_rx,
                };
                store.ingest(Upload {
                    candidate_name: Some("a.txt"),
                    byte_size: 4,
                    content: Some(&mut reader),
                    origin: "10.0.0.7",
                })
            })
        };
        started_rx.recv().unwrap();

        // The sweep after this ingestion must not count or remove a.txt.
        put(&store, "b.txt", b"b").unwrap();
        assert_eq!(names(&store), vec!["b.txt"]);
        assert!(store.root().join("a.txt").is_file());

        set_mtime(&store, "b.txt", 1);
        resume_tx.send(()).unwrap();
        let artifact = writer.join().unwrap().unwrap();
        assert_eq!(artifact.name, "a.txt");
        assert_eq!(artifact.size_bytes, 4);

        assert_eq!(names(&store), vec!["a.txt"]);
        assert_eq!(fs::read(store.root().join("a.txt")).unwrap(), b"slow");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn sweep_keeps_newest_by_mtime_then_name(
            mtimes in proptest::collection::vec(1u64..50, 2..12),
            capacity in 1i64..12,
        ) {
            let dir = tempfile::tempdir().unwrap();
            let store = open_store(dir.path(), 100);
            let mut expected: Vec<(u64, String)> = Vec::new();
            for (i, secs) in mtimes.iter().enumerate() {
                let name = format!("f{i:02}.txt");
                put(&store, &name, b"x").unwrap();
                set_mtime(&store, &name, *secs);
                expected.push((*secs, name));
            }
            expected.sort();

            store.capacity().set(capacity).unwrap();
            let removed = store.evict().unwrap();

            let excess = expected.len().saturating_sub(capacity as usize);
            let oldest: Vec<String> =
                expected[..excess].iter().map(|(_, n)| n.clone()).collect();
            let mut survivors: Vec<String> =
                expected[excess..].iter().map(|(_, n)| n.clone()).collect();
            survivors.sort();
            prop_assert_eq!(removed, oldest);
            prop_assert_eq!(names(&store), survivors);
        }
    }

    #[test]
    fn debug_format() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), 4);
        let debug = format!("{store:?}");
        assert!(debug.contains("DirectoryStore"));
        assert!(debug.contains("Capacity(4)"));
    }
}
