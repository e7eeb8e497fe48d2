use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use lanshare_store::policy::{
    DEFAULT_FILE_EXTENSIONS, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_VIDEO_SIZE,
    DEFAULT_VIDEO_EXTENSIONS,
};
use lanshare_store::StorePolicy;
use lanshare_types::StoreKind;

use crate::error::{ServerError, ServerResult};

pub const DEFAULT_FILE_CAPACITY: i64 = 20;
pub const DEFAULT_VIDEO_CAPACITY: i64 = 10;
pub const DEFAULT_MESSAGE_CAPACITY: i64 = 20;

pub const FILE_ORIGINS: &str = "file_origins.json";
pub const VIDEO_ORIGINS: &str = "video_origins.json";
pub const MESSAGE_HISTORY: &str = "message_history.json";
pub const CURRENT_MESSAGE: &str = "message.json";

/// Top-level server configuration, read from a TOML file.
///
/// Every field has a default, so a partial file only overrides what it names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub app_name: String,
    pub show_startup_info: bool,
    pub bind_addr: SocketAddr,
    /// Directory holding the store folders and the JSON documents.
    pub data_root: PathBuf,
    pub upload_folder: String,
    pub video_folder: String,
    pub files: StoreConfig,
    pub videos: StoreConfig,
    pub messages: HistoryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            app_name: "LanShare".into(),
            show_startup_info: true,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            data_root: PathBuf::from("."),
            upload_folder: "uploads".into(),
            video_folder: "videos".into(),
            files: StoreConfig {
                allowed_extensions: Some(to_strings(DEFAULT_FILE_EXTENSIONS)),
                max_file_size: Some(DEFAULT_MAX_FILE_SIZE),
                capacity: Some(DEFAULT_FILE_CAPACITY),
            },
            videos: StoreConfig {
                allowed_extensions: Some(to_strings(DEFAULT_VIDEO_EXTENSIONS)),
                max_file_size: Some(DEFAULT_MAX_VIDEO_SIZE),
                capacity: Some(DEFAULT_VIDEO_CAPACITY),
            },
            messages: HistoryConfig::default(),
        }
    }
}

/// Per-store overrides. Unset fields fall back to the store kind's defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub allowed_extensions: Option<Vec<String>>,
    pub max_file_size: Option<u64>,
    pub capacity: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: i64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_MESSAGE_CAPACITY,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ServerConfig {
    /// Read `path`. A missing file is created from defaults; a file that
    /// fails to parse is reported and replaced by defaults in memory only.
    pub fn load_or_init(path: &Path) -> ServerResult<Self> {
        match fs::read_to_string(path) {
            Ok(raw) => match toml::from_str::<ServerConfig>(&raw) {
                Ok(config) => Ok(config),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "config file is malformed, using defaults"
                    );
                    Ok(Self::default())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.save(path)?;
                tracing::info!(path = %path.display(), "wrote default config");
                Ok(config)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> ServerResult<()> {
        let rendered =
            toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, rendered)?;
        Ok(())
    }

    pub fn store(&self, kind: StoreKind) -> &StoreConfig {
        match kind {
            StoreKind::File => &self.files,
            StoreKind::Video => &self.videos,
        }
    }

    pub fn store_dir(&self, kind: StoreKind) -> PathBuf {
        let folder = match kind {
            StoreKind::File => &self.upload_folder,
            StoreKind::Video => &self.video_folder,
        };
        self.data_root.join(folder)
    }

    pub fn origins_path(&self, kind: StoreKind) -> PathBuf {
        let name = match kind {
            StoreKind::File => FILE_ORIGINS,
            StoreKind::Video => VIDEO_ORIGINS,
        };
        self.data_root.join(name)
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_root.join(MESSAGE_HISTORY)
    }

    pub fn current_message_path(&self) -> PathBuf {
        self.data_root.join(CURRENT_MESSAGE)
    }

    /// Effective ingestion policy for `kind`.
    pub fn policy(&self, kind: StoreKind) -> StorePolicy {
        let defaults = match kind {
            StoreKind::File => StorePolicy::files(),
            StoreKind::Video => StorePolicy::videos(),
        };
        let overrides = self.store(kind);
        let max_size = overrides.max_file_size.unwrap_or(defaults.max_size());
        match &overrides.allowed_extensions {
            Some(exts) => StorePolicy::new(exts, max_size),
            None => StorePolicy::new(defaults.allowed_extensions(), max_size),
        }
    }

    /// Configured starting capacity for `kind`.
    pub fn capacity(&self, kind: StoreKind) -> i64 {
        let fallback = match kind {
            StoreKind::File => DEFAULT_FILE_CAPACITY,
            StoreKind::Video => DEFAULT_VIDEO_CAPACITY,
        };
        self.store(kind).capacity.unwrap_or(fallback)
    }

    /// URL other machines on the LAN should open.
    pub fn share_url(&self) -> String {
        let ip = lanshare_ledger::lan_address();
        format!("http://{}:{}", ip, self.bind_addr.port())
    }
}
