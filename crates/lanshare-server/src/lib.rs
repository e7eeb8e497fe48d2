//! HTTP server for LanShare.
//!
//! Serves the file store, the video store and the message board to browsers
//! on the local network. Handlers are thin: they resolve the client address,
//! move blocking work onto the blocking pool and map typed errors onto
//! `{"error", "kind"}` JSON responses.

pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::{HistoryConfig, ServerConfig, StoreConfig};
pub use error::{ServerError, ServerResult};
pub use extract::ClientAddr;
pub use server::LanShareServer;
pub use state::{AppInfo, AppState};
