//! Artifact name sanitization and collision suffixes.
//!
//! Client-supplied names are untrusted. A sanitized name:
//! - contains no path separators and no control characters
//! - does not start or end with `.` or `_` in its stem
//! - keeps only alphanumerics (any script), `-`, `_` and `.` in its stem
//! - always ends with the validated extension
//! - never names a Windows device (`CON`, `NUL`, `COM1`, ...)

/// Stem used when nothing survives sanitization.
pub const FALLBACK_STEM: &str = "upload";

/// Longest stem kept, in bytes. Leaves room for a suffix and extension
/// within common 255-byte filename limits.
const MAX_STEM_BYTES: usize = 200;

const WINDOWS_DEVICES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

fn sanitize_stem(raw: &str) -> String {
    let spaced: String = raw
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');

    let mut stem = String::with_capacity(trimmed.len().min(MAX_STEM_BYTES));
    for c in trimmed.chars() {
        if stem.len() + c.len_utf8() > MAX_STEM_BYTES {
            break;
        }
        stem.push(c);
    }
    let stem = stem.trim_end_matches(|c| c == '.' || c == '_').to_string();

    if stem.is_empty() {
        return FALLBACK_STEM.to_string();
    }
    if WINDOWS_DEVICES.iter().any(|d| d.eq_ignore_ascii_case(&stem)) {
        return format!("_{stem}");
    }
    stem
}

/// Turn an untrusted candidate into a filesystem-safe `stem.ext`.
///
/// `ext` is the already-validated extension of `candidate`; its original
/// case is preserved.
pub fn sanitize(candidate: &str, ext: &str) -> String {
    let raw_stem = candidate
        .strip_suffix(ext)
        .and_then(|s| s.strip_suffix('.'))
        .unwrap_or(candidate);
    format!("{}.{}", sanitize_stem(raw_stem), ext)
}

/// `report.txt` + 2 → `report_2.txt`. Names without an extension get the
/// suffix appended.
pub fn with_suffix(name: &str, n: u32) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{n}.{ext}"),
        None => format!("{name}_{n}"),
    }
}

/// Whether `name` may be resolved inside a store directory.
///
/// Used on the retrieve/delete paths, where names arrive from URLs rather
/// than from ingestion.
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && !name.chars().any(char::is_control)
}
