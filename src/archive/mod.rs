//! ZIP container access with lazily materialized members

pub mod detect;

use std::io::{Cursor, Read};
use std::sync::Arc;
use zip::ZipArchive;

use crate::error::{DictError, Result};

pub use detect::{DictionaryFormat, detect_format};

type ZipReader = ZipArchive<Cursor<Arc<[u8]>>>;

/// Upper bound on the buffer reserved up front for one member.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// An opened dictionary archive.
///
/// Cloning is cheap: the central directory is shared and every clone gets its
/// own cursor, so parser workers can read members concurrently.
#[derive(Debug, Clone)]
pub struct Archive {
    zip: ZipReader,
    names: Arc<[String]>,
}

/// A member whose bytes are only inflated when [`ArchiveEntry::bytes`] is called.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    archive: Archive,
    name: String,
}

impl ArchiveEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        self.archive.read(&self.name)
    }
}

impl Archive {
    pub fn open(bytes: impl Into<Arc<[u8]>>) -> Result<Self> {
        let zip = ZipArchive::new(Cursor::new(bytes.into())).map_err(|e| DictError::ArchiveRead {
            file: None,
            reason: e.to_string(),
        })?;
        let names: Vec<String> = zip
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_string)
            .collect();
        tracing::debug!("Opened archive with {} member(s)", names.len());
        Ok(Self {
            zip,
            names: names.into(),
        })
    }

    /// Member names in central-directory order, directories excluded.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn entries(&self) -> impl Iterator<Item = ArchiveEntry> + '_ {
        self.names.iter().map(|name| ArchiveEntry {
            archive: self.clone(),
            name: name.clone(),
        })
    }

    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let mut zip = self.zip.clone();
        let read_error = |reason: String| DictError::ArchiveRead {
            file: Some(name.to_string()),
            reason,
        };
        let mut file = zip.by_name(name).map_err(|e| read_error(e.to_string()))?;
        let mut data = Vec::with_capacity(capacity_hint(file.size()));
        file.read_to_end(&mut data)
            .map_err(|e| read_error(e.to_string()))?;
        Ok(data)
    }

    /// Opens a ZIP stored inside this archive (e.g. `foo.res.zip`) on the same interface.
    pub fn open_nested(&self, name: &str) -> Result<Archive> {
        let bytes = self.read(name)?;
        Archive::open(bytes).map_err(|e| match e {
            DictError::ArchiveRead { reason, .. } => DictError::ArchiveRead {
                file: Some(name.to_string()),
                reason,
            },
            other => other,
        })
    }

    /// First member whose file name (ignoring directories) satisfies `pred`.
    pub fn find(&self, pred: impl Fn(&str) -> bool) -> Option<&str> {
        self.names
            .iter()
            .map(String::as_str)
            .find(|name| pred(basename(name)))
    }
}

/// Final path component of an archive member name.
pub fn basename(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// The central directory's uncompressed size is untrusted; larger members
/// grow the buffer as they are read.
fn capacity_hint(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_PREALLOC)).unwrap_or(0)
}


#[cfg(test)]
mod tests {
    use super::test_support::build_zip;
    use super::*;

    #[test]
    fn test_lists_and_reads_members() {
        let bytes = build_zip(&[("a/index.json", b"{}"), ("term_bank_1.json", b"[]")]);
        let archive = Archive::open(bytes).unwrap();
        assert_eq!(archive.len(), 2);
        assert!(archive.contains("a/index.json"));
        assert_eq!(archive.read("term_bank_1.json").unwrap(), b"[]");

        let entries: Vec<_> = archive.entries().collect();
        assert_eq!(entries[0].name(), "a/index.json");
        assert_eq!(entries[0].bytes().unwrap(), b"{}");
    }

    #[test]
    fn test_missing_member_names_file() {
        let archive = Archive::open(build_zip(&[("x.txt", b"x")])).unwrap();
        let err = archive.read("y.txt").unwrap_err();
        assert!(matches!(err, DictError::ArchiveRead { file: Some(ref f), .. } if f == "y.txt"));
    }

    #[test]
    fn test_declared_size_does_not_drive_allocation() {
        assert_eq!(capacity_hint(12), 12);
        assert_eq!(capacity_hint(u64::MAX), MAX_PREALLOC as usize);
        assert_eq!(capacity_hint(0xFFFF_FFFF), MAX_PREALLOC as usize);
    }

    #[test]
    fn test_garbage_is_archive_read_error() {
        let err = Archive::open(b"definitely not a zip".to_vec()).unwrap_err();
        assert!(matches!(err, DictError::ArchiveRead { file: None, .. }));
    }

    #[test]
    fn test_nested_archive() {
        let inner = build_zip(&[("styles.css", b"b { color: red }")]);
        let outer = build_zip(&[("demo.res.zip", &inner)]);
        let archive = Archive::open(outer).unwrap();
        let nested = archive.open_nested("demo.res.zip").unwrap();
        assert_eq!(nested.read("styles.css").unwrap(), b"b { color: red }");
    }

    #[test]
    fn test_find_matches_basename() {
        let archive = Archive::open(build_zip(&[("dir/demo.ifo", b"")])).unwrap();
        assert_eq!(archive.find(|n| n.ends_with(".ifo")), Some("dir/demo.ifo"));
        assert_eq!(basename("dir/demo.ifo"), "demo.ifo");
    }
}
