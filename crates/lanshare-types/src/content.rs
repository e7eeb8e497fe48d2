//! Static extension → content class lookup.
//!
//! Classification never inspects bytes; it is decided purely from the
//! artifact name's final extension, case-insensitively.

use serde::{Deserialize, Serialize};

/// How a stored artifact may be previewed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentClass {
    Image,
    Audio,
    Video,
    /// Plain text rendered inline.
    Text,
    Archive,
    Unsupported,
}

const IMAGE: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "svg"];
const AUDIO: &[&str] = &["mp3", "wav", "ogg", "flac", "m4a"];
const VIDEO: &[&str] = &["mp4", "avi", "mov", "wmv", "mkv", "flv", "webm"];
const TEXT: &[&str] = &["txt", "md", "csv", "log", "json"];
const ARCHIVE: &[&str] = &["zip", "rar", "7z", "tar", "gz"];

impl ContentClass {
    /// Classify by bare extension (no leading dot).
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        let ext = ext.as_str();
        if IMAGE.contains(&ext) {
            Self::Image
        } else if AUDIO.contains(&ext) {
            Self::Audio
        } else if VIDEO.contains(&ext) {
            Self::Video
        } else if TEXT.contains(&ext) {
            Self::Text
        } else if ARCHIVE.contains(&ext) {
            Self::Archive
        } else {
            Self::Unsupported
        }
    }

    /// Classify an artifact name by its final extension.
    pub fn of(name: &str) -> Self {
        match name.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unsupported,
        }
    }

    /// Whether the serving layer may return this class inline.
    pub fn is_previewable(self) -> bool {
        matches!(self, Self::Image | Self::Audio | Self::Video | Self::Text)
    }
}

/// MIME type for a bare extension, `application/octet-stream` when unknown.
pub fn mime_type(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "mp4" => "video/mp4",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "wmv" => "video/x-ms-wmv",
        "mkv" => "video/x-matroska",
        "flv" => "video/x-flv",
        "webm" => "video/webm",
        "txt" | "log" => "text/plain; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "7z" => "application/x-7z-compressed",
        "rar" => "application/vnd.rar",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => "application/octet-stream",
    }
}
