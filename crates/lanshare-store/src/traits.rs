use std::fs::File;
use std::io::Read;

use lanshare_types::{Artifact, Capacity, StoreKind};

use crate::error::StoreResult;

/// One ingestion request as received from the serving layer.
pub struct Upload<'a> {
    /// Client-supplied filename. `None` or blank is rejected.
    pub candidate_name: Option<&'a str>,
    /// Declared size, checked against the ceiling before anything is written.
    pub byte_size: u64,
    /// Content to write. `None` means the request carried no file.
    pub content: Option<&'a mut dyn Read>,
    /// Raw client address; normalized before it reaches the origin ledger.
    pub origin: &'a str,
}

/// An opened artifact ready to be streamed back.
#[derive(Debug)]
pub struct Retrieved {
    pub artifact: Artifact,
    pub file: File,
}

/// Capacity-bounded collection of named artifacts.
///
/// All implementations must satisfy these invariants:
/// - Names are unique within the store at any instant.
/// - Validation failures are reported before any mutation.
/// - After a successful `ingest`, the eviction sweep has run against the
///   current capacity, so `list().len() <= capacity().get()`.
/// - Eviction removes the oldest artifacts by modification time first.
pub trait ArtifactStore: Send + Sync {
    fn kind(&self) -> StoreKind;

    /// The store's mutable retention limit.
    fn capacity(&self) -> &Capacity;

    /// Validate, name, write and record an upload, then sweep.
    fn ingest(&self, upload: Upload<'_>) -> StoreResult<Artifact>;

    /// All artifacts, newest first, joined with their recorded origins.
    fn list(&self) -> StoreResult<Vec<Artifact>>;

    /// Open an artifact by name for download or preview.
    fn retrieve(&self, name: &str) -> StoreResult<Retrieved>;

    /// Remove an artifact by name. Its origin entry is left in place.
    fn delete(&self, name: &str) -> StoreResult<()>;

    /// Remove the oldest artifacts beyond capacity. Returns removed names.
    fn evict(&self) -> StoreResult<Vec<String>>;
}
