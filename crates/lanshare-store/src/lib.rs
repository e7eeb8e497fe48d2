//! Capacity-bounded artifact stores for LanShare.
//!
//! A store owns one directory, one extension whitelist, one per-artifact
//! size ceiling and one runtime-mutable capacity. LanShare runs two: the
//! general file store and the video store. They differ only in policy.
//!
//! # Ingestion
//!
//! 1. Reject missing content, blank names, unlisted extensions and oversize
//!    declarations before touching the filesystem.
//! 2. Sanitize the candidate name ([`naming::sanitize`]).
//! 3. Claim `name`, `name_1`, `name_2`, ... with an atomic create-if-absent
//!    open, looping only on "already exists".
//! 4. Stream the content, re-checking the ceiling on the bytes actually read.
//! 5. Record the uploader's normalized address in the origin ledger. Ledger
//!    failures are logged and never fail the ingestion.
//! 6. Run the eviction sweep: while `count > capacity`, delete the artifact
//!    with the oldest modification time.
//!
//! # Storage Backends
//!
//! All backends implement the [`ArtifactStore`] trait:
//!
//! - [`DirectoryStore`] -- one flat directory on the local filesystem

pub mod directory;
pub mod error;
pub mod naming;
pub mod policy;
pub mod traits;

pub use directory::DirectoryStore;
pub use error::{StoreError, StoreResult};
pub use policy::StorePolicy;
pub use traits::{ArtifactStore, Retrieved, Upload};
