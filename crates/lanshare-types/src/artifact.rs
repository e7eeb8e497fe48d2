use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::content::ContentClass;

/// Which store an artifact lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    File,
    Video,
}

impl StoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored binary object.
///
/// `name` is unique within its store's directory. `modified_at` orders both
/// listings (newest first) and eviction (oldest first).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub size_bytes: u64,
    pub modified_at: SystemTime,
    /// Best-effort uploader address from the origin ledger.
    pub origin_address: Option<String>,
}

impl Artifact {
    /// Final extension without the dot, if any.
    pub fn extension(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(_, ext)| ext)
    }

    pub fn class(&self) -> ContentClass {
        ContentClass::of(&self.name)
    }

    /// `modified_at` as fractional seconds since the UNIX epoch.
    pub fn modified_secs(&self) -> f64 {
        self.modified_at
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }
}
