//! Foundation types for LanShare.
//!
//! This crate provides the value types shared by the ledger, store and
//! server crates. Every other LanShare crate depends on `lanshare-types`.
//!
//! # Key Types
//!
//! - [`Artifact`] — A stored file or video with size, mtime and origin address
//! - [`StoreKind`] — Which store (file or video) an artifact belongs to
//! - [`Message`] — A timestamped message-board entry
//! - [`Capacity`] — Runtime-mutable retention limit, guarded for writes
//! - [`ContentClass`] — Extension-based preview classification

pub mod artifact;
pub mod capacity;
pub mod content;
pub mod error;
pub mod message;

pub use artifact::{Artifact, StoreKind};
pub use capacity::Capacity;
pub use content::{mime_type, ContentClass};
pub use error::{ErrorKind, TypeError};
pub use message::Message;
