//! JSON-backed ledgers for LanShare.
//!
//! Two families of persisted documents live here:
//!
//! - [`OriginLedger`] -- artifact name → uploader address, one per store
//! - [`HistoryLog`] -- the capacity-bounded message board plus its
//!   current-message projection
//!
//! Both are whole-document read-modify-write, serialized per instance by a
//! mutex and written atomically (temp file + rename). [`address`] holds the
//! origin normalization shared with the asset stores.

pub mod address;
mod document;
pub mod error;
pub mod history;
pub mod origin;

pub use address::{lan_address, normalize_origin, UNKNOWN_ADDRESS};
pub use error::{LedgerError, LedgerResult};
pub use history::HistoryLog;
pub use origin::{OriginLedger, OriginMap};
