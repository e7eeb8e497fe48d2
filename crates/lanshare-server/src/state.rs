use std::sync::Arc;

use lanshare_ledger::{HistoryLog, OriginLedger};
use lanshare_store::{ArtifactStore, DirectoryStore};
use lanshare_types::{Capacity, StoreKind};

use crate::config::ServerConfig;
use crate::error::ServerResult;

/// Static facts reported by `/api/info`.
#[derive(Clone, Debug)]
pub struct AppInfo {
    pub name: String,
    pub version: &'static str,
    pub share_url: String,
}

/// Everything the handlers share.
#[derive(Clone)]
pub struct AppState {
    pub files: Arc<dyn ArtifactStore>,
    pub videos: Arc<dyn ArtifactStore>,
    pub history: Arc<HistoryLog>,
    pub info: Arc<AppInfo>,
    /// Upper bound on request bodies per store, in bytes.
    pub file_body_limit: usize,
    pub video_body_limit: usize,
}

/// Slack on top of the artifact ceiling for multipart framing.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

impl AppState {
    /// Open both stores and the message history described by `config`.
    pub fn open(config: &ServerConfig) -> ServerResult<Self> {
        let files = open_store(config, StoreKind::File)?;
        let videos = open_store(config, StoreKind::Video)?;
        let history = HistoryLog::new(
            config.history_path(),
            config.current_message_path(),
            Capacity::new(config.messages.capacity)?,
        );

        let body_limit = |store: &DirectoryStore| {
            usize::try_from(store.policy().max_size().saturating_add(MULTIPART_OVERHEAD))
                .unwrap_or(usize::MAX)
        };
        let file_body_limit = body_limit(&files);
        let video_body_limit = body_limit(&videos);

        Ok(Self {
            files: Arc::new(files),
            videos: Arc::new(videos),
            history: Arc::new(history),
            info: Arc::new(AppInfo {
                name: config.app_name.clone(),
                version: env!("CARGO_PKG_VERSION"),
                share_url: config.share_url(),
            }),
            file_body_limit,
            video_body_limit,
        })
    }

    pub fn store(&self, kind: StoreKind) -> &Arc<dyn ArtifactStore> {
        match kind {
            StoreKind::File => &self.files,
            StoreKind::Video => &self.videos,
        }
    }
}

fn open_store(config: &ServerConfig, kind: StoreKind) -> ServerResult<DirectoryStore> {
    let store = DirectoryStore::open(
        kind,
        config.store_dir(kind),
        config.policy(kind),
        Capacity::new(config.capacity(kind))?,
        OriginLedger::new(config.origins_path(kind)),
    )?;
    Ok(store)
}
