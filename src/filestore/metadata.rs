//! Metadata files that travel alongside a blob's data file.
//!
//! Each metadata kind is identified by a filename suffix (e.g. `_refcount`)
//! and is either movable (follows the data file across a state transition)
//! or not. On reload, the store matches resident files against
//! [`KNOWN_SUFFIXES`] to re-register metadata without being told about it.
use std::io;
use std::path::{Path, PathBuf};

use camino::Utf8Path;

/// A metadata kind: its filename suffix and whether it follows a `MoveTo`.
#[derive(Debug, Clone, Copy)]
pub struct MetadataKind {
    pub suffix: &'static str,
    pub movable: bool,
}

pub const REFCOUNT: MetadataKind = MetadataKind {
    suffix: "_refcount",
    movable: true,
};

pub const KNOWN_SUFFIXES: &[MetadataKind] = &[REFCOUNT];

#[must_use]
pub fn find_suffix(filename: &str) -> Option<MetadataKind> {
    KNOWN_SUFFIXES.iter().copied().find(|kind| filename.ends_with(kind.suffix))
}

fn path_for(data_path: &Utf8Path, kind: MetadataKind) -> PathBuf {
    let mut os_string = data_path.as_os_str().to_owned();
    os_string.push(kind.suffix);
    PathBuf::from(os_string)
}

/// Reads the metadata file, or `None` if it does not exist.
pub fn read(data_path: &Utf8Path, kind: MetadataKind) -> io::Result<Option<Vec<u8>>> {
    match std::fs::read(path_for(data_path, kind)) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Compare-and-write: returns `true` if the file's contents changed.
pub fn write(data_path: &Utf8Path, kind: MetadataKind, contents: &[u8]) -> io::Result<bool> {
    let path = path_for(data_path, kind);
    if let Ok(existing) = std::fs::read(&path) {
        if existing == contents {
            return Ok(false);
        }
    }
    if let Some(parent) = Path::new(&path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, contents)?;
    Ok(true)
}

pub fn delete(data_path: &Utf8Path, kind: MetadataKind) -> io::Result<()> {
    match std::fs::remove_file(path_for(data_path, kind)) {
        Ok(()) | Err(_) => Ok(()),
    }
}

/// Hardlinks a movable metadata file from `from` to `to`; a no-op if the
/// source has no such metadata or the kind is not movable.
pub fn hardlink_if_present(from: &Utf8Path, to: &Utf8Path, kind: MetadataKind) -> io::Result<()> {
    if !kind.movable {
        return Ok(());
    }
    let source = path_for(from, kind);
    if !source.exists() {
        return Ok(());
    }
    let dest = path_for(to, kind);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::hard_link(&source, &dest)
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    #[test]
    fn it_finds_the_refcount_suffix() {
        assert!(find_suffix("sha256:abc_refcount").is_some());
        assert!(find_suffix("sha256:abc").is_none());
    }

    #[test]
    fn write_reports_whether_contents_changed() {
        let dir = tempdir();
        let data_path = Utf8PathBuf::from_path_buf(dir.join("blob")).unwrap();
        assert!(write(&data_path, REFCOUNT, b"1").unwrap());
        assert!(!write(&data_path, REFCOUNT, b"1").unwrap());
        assert!(write(&data_path, REFCOUNT, b"2").unwrap());
        assert_eq!(read(&data_path, REFCOUNT).unwrap(), Some(b"2".to_vec()));
    }

    fn tempdir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kraken-metadata-test-{}", kraken_test_helpers::random::string(12)));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
