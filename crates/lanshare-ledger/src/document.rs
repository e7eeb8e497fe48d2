//! Whole-file JSON documents.
//!
//! A document is always read and written in full. Writes go to a temporary
//! file in the same directory and are renamed over the target, so a reader
//! sees either the previous or the new document, never a torn one.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::{LedgerError, LedgerResult};

fn io_err(path: &Path, source: io::Error) -> LedgerError {
    LedgerError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Load a document, returning `T::default()` when the file does not exist.
pub(crate) fn load<T>(path: &Path) -> LedgerResult<T>
where
    T: DeserializeOwned + Default,
{
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(io_err(path, e)),
    };
    serde_json::from_reader(BufReader::new(file)).map_err(|e| LedgerError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Where a document that failed to decode is moved aside.
pub(crate) fn quarantine_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".corrupt");
    path.with_file_name(name)
}

/// Like [`load`], but a corrupt document is moved to
/// [`quarantine_path`] and replaced by `T::default()`. Used on write paths
/// so one bad file cannot wedge every later update.
pub(crate) fn load_or_reset<T>(path: &Path) -> LedgerResult<T>
where
    T: DeserializeOwned + Default,
{
    match load(path) {
        Err(LedgerError::Corrupt { reason, .. }) => {
            let aside = quarantine_path(path);
            fs::rename(path, &aside).map_err(|e| io_err(path, e))?;
            warn!(
                path = %path.display(),
                moved_to = %aside.display(),
                reason = %reason,
                "corrupt document moved aside; starting empty"
            );
            Ok(T::default())
        }
        other => other,
    }
}

/// Replace a document atomically.
pub(crate) fn save<T>(path: &Path, value: &T) -> LedgerResult<()>
where
    T: Serialize + ?Sized,
{
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;

    let tmp = NamedTempFile::new_in(parent).map_err(|e| io_err(parent, e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, value)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        writer.flush().map_err(|e| io_err(path, e))?;
    }
    tmp.as_file().sync_data().map_err(|e| io_err(path, e))?;
    tmp.persist(path).map_err(|e| io_err(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let map: BTreeMap<String, String> = load(&dir.path().join("absent.json")).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");
        let mut map = BTreeMap::new();
        map.insert("a.txt".to_string(), "10.0.0.1".to_string());

        save(&path, &map).unwrap();
        let back: BTreeMap<String, String> = load(&path).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        save(&path, &vec![1, 2, 3]).unwrap();
        save(&path, &vec![4]).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("doc.json")]);
    }

    #[test]
    fn malformed_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, b"{not json").unwrap();
        let result: LedgerResult<BTreeMap<String, String>> = load(&path);
        assert!(matches!(result, Err(LedgerError::Corrupt { .. })));
    }

    #[test]
    fn corrupt_file_is_moved_aside_on_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, b"{not json").unwrap();

        let map: BTreeMap<String, String> = load_or_reset(&path).unwrap();
        assert!(map.is_empty());
        assert!(!path.exists());
        let aside = dir.path().join("bad.json.corrupt");
        assert_eq!(quarantine_path(&path), aside);
        assert_eq!(fs::read(&aside).unwrap(), b"{not json");
    }

    #[test]
    fn reset_keeps_valid_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        save(&path, &vec![7]).unwrap();
        let back: Vec<i32> = load_or_reset(&path).unwrap();
        assert_eq!(back, vec![7]);
    }
}
