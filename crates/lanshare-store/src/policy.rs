use crate::error::{StoreError, StoreResult};

/// Default whitelist for the general file store.
pub const DEFAULT_FILE_EXTENSIONS: &[&str] = &[
    "txt", "pdf", "png", "jpg", "jpeg", "gif", "bmp", "md", "zip", "rar", "7z", "csv", "xlsx",
    "docx", "pptx",
];

/// Default whitelist for the video store.
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "wmv", "mkv", "flv", "webm"];

/// 100 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;
/// 500 MiB.
pub const DEFAULT_MAX_VIDEO_SIZE: u64 = 500 * 1024 * 1024;

/// Ingestion constraints for one store: which extensions it accepts and the
/// largest single artifact it will write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorePolicy {
    /// Lowercase, without the leading dot.
    allowed_extensions: Vec<String>,
    max_size: u64,
}

impl StorePolicy {
    /// Build a policy. Extensions may be given as `"txt"` or `".TXT"`.
    pub fn new<I, S>(allowed_extensions: I, max_size: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allowed_extensions: Vec<String> = allowed_extensions
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        allowed_extensions.sort();
        allowed_extensions.dedup();
        Self {
            allowed_extensions,
            max_size,
        }
    }

    pub fn files() -> Self {
        Self::new(DEFAULT_FILE_EXTENSIONS, DEFAULT_MAX_FILE_SIZE)
    }

    pub fn videos() -> Self {
        Self::new(DEFAULT_VIDEO_EXTENSIONS, DEFAULT_MAX_VIDEO_SIZE)
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Return the candidate's extension if it is whitelisted.
    pub fn check_extension<'a>(&self, candidate: &'a str) -> StoreResult<&'a str> {
        let invalid = || StoreError::InvalidType {
            name: candidate.to_string(),
        };
        let (_, ext) = candidate.rsplit_once('.').ok_or_else(invalid)?;
        let lowered = ext.to_ascii_lowercase();
        if ext.is_empty() || !self.allowed_extensions.iter().any(|a| *a == lowered) {
            return Err(invalid());
        }
        Ok(ext)
    }

    /// Reject sizes above the ceiling.
    pub fn check_size(&self, size: u64) -> StoreResult<()> {
        if size > self.max_size {
            return Err(StoreError::TooLarge {
                size,
                limit: self.max_size,
            });
        }
        Ok(())
    }
}
