//! Archive index cache
//!
//! Entry names of an artifact's archive are scanned once and kept for the
//! lifetime of the index. Concurrent callers asking for the same unscanned
//! artifact wait for the first scan instead of repeating it; unrelated
//! artifacts never wait on each other.
//!
//! Entry bytes are not cached. [`ArchiveIndex::extract_entry`] re-reads the
//! archive each time.

use std::collections::HashSet;
use std::io::{Cursor, Read};
use std::sync::Arc;

use dashmap::DashMap;
use deptrail_core::{ArtifactId, ArtifactStore, ResolvedArtifact};
use once_cell::sync::OnceCell;
use tracing::{trace, warn};

use crate::error::ArchiveError;

/// Strip a single leading separator from an entry name
pub fn normalize_entry(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}

/// Normalized entry names of one archive
#[derive(Debug, Default)]
pub struct EntryIndex {
    names: HashSet<String>,
}

impl EntryIndex {
    pub fn contains(&self, path: &str) -> bool {
        self.names.contains(normalize_entry(path))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

type IndexKey = (ArtifactId, bool);

/// Lazily built, shared index of archive entries per artifact
pub struct ArchiveIndex {
    store: Arc<dyn ArtifactStore>,
    indexes: DashMap<IndexKey, Arc<OnceCell<Arc<EntryIndex>>>>,
}

impl ArchiveIndex {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            indexes: DashMap::new(),
        }
    }

    /// Check whether an artifact's archive contains `path`, scanning it on first use
    pub fn has_entry(&self, artifact: &ResolvedArtifact, path: &str) -> Result<bool, ArchiveError> {
        Ok(self.index(artifact)?.contains(path))
    }

    /// Get the entry index of an artifact, scanning it on first use
    pub fn index(&self, artifact: &ResolvedArtifact) -> Result<Arc<EntryIndex>, ArchiveError> {
        // Clone the cell out so the map shard is not locked during the scan
        let cell = self
            .indexes
            .entry(Self::key(artifact))
            .or_default()
            .clone();
        cell.get_or_try_init(|| self.scan(artifact).map(Arc::new))
            .cloned()
    }

    /// Whether an artifact has been scanned
    pub fn is_indexed(&self, artifact: &ResolvedArtifact) -> bool {
        self.indexes
            .get(&Self::key(artifact))
            .is_some_and(|cell| cell.get().is_some())
    }

    /// Read the bytes of an entry from an already scanned artifact
    pub fn extract_entry(&self, artifact: &ResolvedArtifact, path: &str) -> Result<Vec<u8>, ArchiveError> {
        let index = self
            .indexes
            .get(&Self::key(artifact))
            .and_then(|cell| cell.get().cloned())
            .ok_or_else(|| ArchiveError::NotScanned(artifact.id.to_string()))?;

        let path = normalize_entry(path);
        if !index.contains(path) {
            return Err(ArchiveError::EntryNotFound {
                artifact: artifact.id.to_string(),
                path: path.to_string(),
            });
        }

        trace!(artifact = %artifact.id, path, "Extracting entry");
        let mut archive = self.open(artifact)?;
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| ArchiveError::corrupt(artifact.id.to_string(), e.to_string()))?;
            if normalize_entry(entry.name()) != path {
                continue;
            }
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| ArchiveError::corrupt(artifact.id.to_string(), e.to_string()))?;
            return Ok(bytes);
        }

        Err(ArchiveError::EntryNotFound {
            artifact: artifact.id.to_string(),
            path: path.to_string(),
        })
    }

    /// Number of artifacts scanned so far
    pub fn len(&self) -> usize {
        self.indexes.iter().filter(|cell| cell.get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(artifact: &ResolvedArtifact) -> IndexKey {
        (artifact.id.clone(), artifact.test)
    }

    fn open(&self, artifact: &ResolvedArtifact) -> Result<zip::ZipArchive<Cursor<Vec<u8>>>, ArchiveError> {
        let mut content = Vec::new();
        self.store
            .content(artifact)?
            .read_to_end(&mut content)
            .map_err(|e| ArchiveError::corrupt(artifact.id.to_string(), e.to_string()))?;
        zip::ZipArchive::new(Cursor::new(content))
            .map_err(|e| ArchiveError::corrupt(artifact.id.to_string(), e.to_string()))
    }

    fn scan(&self, artifact: &ResolvedArtifact) -> Result<EntryIndex, ArchiveError> {
        trace!(artifact = %artifact.id, "Scanning archive entries");
        let archive = match self.open(artifact) {
            Ok(archive) => archive,
            // Content that is not an archive has no entries
            Err(ArchiveError::Corrupt { message, .. }) => {
                warn!(artifact = %artifact.id, error = %message, "Cannot read archive, treating as empty");
                return Ok(EntryIndex::default());
            }
            Err(e) => return Err(e),
        };
        let names = archive
            .file_names()
            .map(|name| normalize_entry(name).to_string())
            .collect();
        Ok(EntryIndex { names })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use deptrail_store::InMemoryArtifactStore;

    use super::*;

    fn archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buffer);
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored);
            for (name, data) in entries {
                zip.start_file(*name, options).unwrap();
                zip.write_all(data).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer.into_inner()
    }

    fn setup(entries: &[(&str, &[u8])]) -> (ArchiveIndex, ResolvedArtifact) {
        let store = Arc::new(InMemoryArtifactStore::new());
        let handle = store.insert(ArtifactId::new("g", "a", "1"), "jar", archive(entries), None);
        (ArchiveIndex::new(store), handle)
    }

    #[test]
    fn test_has_entry_normalizes_leading_separator() {
        let (index, handle) = setup(&[("/com/acme/Widget.class", b"w"), ("README", b"r")]);

        assert!(!index.is_indexed(&handle));
        assert!(index.has_entry(&handle, "com/acme/Widget.class").unwrap());
        assert!(index.has_entry(&handle, "README").unwrap());
        assert!(!index.has_entry(&handle, "com/acme/Gadget.class").unwrap());
        assert!(index.is_indexed(&handle));
        assert_eq!(index.index(&handle).unwrap().len(), 2);
    }

    #[test]
    fn test_extract_requires_scan() {
        let (index, handle) = setup(&[("a/b.txt", b"hello")]);

        assert!(matches!(
            index.extract_entry(&handle, "a/b.txt"),
            Err(ArchiveError::NotScanned(_))
        ));

        index.has_entry(&handle, "a/b.txt").unwrap();
        assert_eq!(index.extract_entry(&handle, "a/b.txt").unwrap(), b"hello");
        assert!(matches!(
            index.extract_entry(&handle, "missing"),
            Err(ArchiveError::EntryNotFound { .. })
        ));
    }

    #[test]
    fn test_extract_entry_with_leading_separator() {
        let (index, handle) = setup(&[("/META-INF/x.properties", b"k=v")]);
        index.index(&handle).unwrap();
        assert_eq!(index.extract_entry(&handle, "META-INF/x.properties").unwrap(), b"k=v");
    }

    #[test]
    fn test_non_archive_content_is_empty() {
        let store = Arc::new(InMemoryArtifactStore::new());
        let handle = store.insert(ArtifactId::new("g", "a", "1"), "pom", &b"<project/>"[..], None);
        let index = ArchiveIndex::new(store);

        assert!(!index.has_entry(&handle, "anything").unwrap());
        assert!(index.index(&handle).unwrap().is_empty());
    }

    #[test]
    fn test_missing_content_is_an_error() {
        let index = ArchiveIndex::new(Arc::new(InMemoryArtifactStore::new()));
        let handle = ResolvedArtifact::new(ArtifactId::new("g", "a", "1"), "jar");

        assert!(matches!(
            index.has_entry(&handle, "x"),
            Err(ArchiveError::Store(_))
        ));
        assert!(!index.is_indexed(&handle));
        assert!(index.is_empty());
    }
}
