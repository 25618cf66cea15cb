//! On-disk local repository
//!
//! Layout (one directory per group segment):
//!
//! ```text
//! <root>/
//! └── org/example/
//!     └── widget/
//!         └── 1.0/
//!             ├── widget-1.0.jar
//!             ├── widget-1.0-tests.jar
//!             └── widget-1.0.pom
//! ```
//!
//! A directory is an artifact directory when at least one of its version
//! subdirectories holds an `artifact-version.*` file. Descriptors are read
//! from the sibling `.pom` file, falling back to the one embedded in the
//! archive.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, Cursor, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use deptrail_core::{
    ArtifactId, ArtifactStore, ContentStream, ResolvedArtifact, StoreError, DEFAULT_PACKAGING,
};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, trace};

use crate::embedded::embedded_descriptor;

/// Extension of descriptor files
const DESCRIPTOR_EXTENSION: &str = "pom";

/// Classifier appended to test archives
const TEST_CLASSIFIER: &str = "tests";

/// File-system backed [`ArtifactStore`]
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    /// Open (and create if needed) a repository rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        info!(path = %root.display(), "Local repository opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn group_dir(&self, group: &str) -> Result<PathBuf, StoreError> {
        if group.is_empty() || group.split('.').any(|s| s.is_empty() || s == "..") {
            return Err(StoreError::invalid_coordinate(format!("group `{}`", group)));
        }
        let mut dir = self.root.clone();
        for segment in group.split('.') {
            dir.push(segment);
        }
        Ok(dir)
    }

    fn version_dir(&self, group: &str, artifact: &str, version: &str) -> Result<PathBuf, StoreError> {
        for part in [artifact, version] {
            if part.is_empty() || part.contains(['/', '\\']) || part == ".." {
                return Err(StoreError::invalid_coordinate(format!("`{}`", part)));
            }
        }
        Ok(self.group_dir(group)?.join(artifact).join(version))
    }

    fn file_stem(artifact: &str, version: &str, test: bool) -> String {
        if test {
            format!("{}-{}-{}", artifact, version, TEST_CLASSIFIER)
        } else {
            format!("{}-{}", artifact, version)
        }
    }

    /// Find the archive file of an artifact variant
    fn archive_file(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
        test: bool,
    ) -> Result<Option<PathBuf>, StoreError> {
        let dir = self.version_dir(group, artifact, version)?;
        let stem = Self::file_stem(artifact, version, test);

        let preferred = dir.join(format!("{}.{}", stem, DEFAULT_PACKAGING));
        if preferred.is_file() {
            return Ok(Some(preferred));
        }

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let path = entry?.path();
            let extension = path.extension().and_then(|e| e.to_str());
            let matches = path.file_stem().and_then(|s| s.to_str()) == Some(stem.as_str())
                && extension != Some(DESCRIPTOR_EXTENSION);
            if matches && path.is_file() {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    fn handle_for(&self, id: ArtifactId, path: &Path, test: bool) -> Result<ResolvedArtifact, StoreError> {
        let packaging = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(DEFAULT_PACKAGING)
            .to_string();
        let modified = fs::metadata(path)?.modified().ok().map(DateTime::<Utc>::from);

        let mut handle = ResolvedArtifact::new(id, packaging).with_test(test);
        handle.last_modified = modified;
        Ok(handle)
    }

    /// Check whether `dir` is an artifact directory named `name`
    fn is_artifact_dir(dir: &Path, name: &str) -> bool {
        let Ok(versions) = fs::read_dir(dir) else {
            return false;
        };
        versions.flatten().any(|version| {
            let version_path = version.path();
            let Some(version_name) = version_path.file_name().and_then(|n| n.to_str()) else {
                return false;
            };
            let prefix = format!("{}-{}.", name, version_name);
            fs::read_dir(&version_path)
                .map(|files| {
                    files.flatten().any(|f| {
                        f.file_name().to_str().is_some_and(|n| n.starts_with(&prefix))
                    })
                })
                .unwrap_or(false)
        })
    }

    fn collect_groups(&self, dir: &Path, segments: &mut Vec<String>, groups: &mut BTreeSet<String>) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            if !segments.is_empty() && Self::is_artifact_dir(&path, &name) {
                groups.insert(segments.join("."));
            }
            segments.push(name);
            self.collect_groups(&path, segments, groups);
            segments.pop();
        }
    }

    /// Write through a uniquely named temp file in the same directory, then
    /// rename over `path`
    fn write_atomically(path: &Path, data: &[u8]) -> Result<(), StoreError> {
        let dir = path
            .parent()
            .ok_or_else(|| StoreError::io(format!("no parent directory for {}", path.display())))?;
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(data)?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Archive extension for a packaging type
fn extension_for(packaging: &str) -> &str {
    match packaging {
        "bundle" | "maven-plugin" | "" => DEFAULT_PACKAGING,
        other => other,
    }
}

impl ArtifactStore for LocalRepository {
    fn list_groups(&self) -> Result<BTreeSet<String>, StoreError> {
        let mut groups = BTreeSet::new();
        self.collect_groups(&self.root, &mut Vec::new(), &mut groups);
        Ok(groups)
    }

    fn list_artifacts(&self, group: &str) -> Result<BTreeSet<String>, StoreError> {
        let dir = self.group_dir(group)?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(entries
            .flatten()
            .filter_map(|entry| {
                let path = entry.path();
                let name = path.file_name()?.to_str()?.to_string();
                Self::is_artifact_dir(&path, &name).then_some(name)
            })
            .collect())
    }

    fn list_versions(&self, group: &str, artifact: &str) -> Result<BTreeSet<String>, StoreError> {
        let dir = self.group_dir(group)?.join(artifact);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e.into()),
        };
        let mut versions = BTreeSet::new();
        for entry in entries.flatten() {
            let Some(version) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if self.archive_file(group, artifact, &version, false)?.is_some() {
                versions.insert(version);
            }
        }
        Ok(versions)
    }

    #[instrument(skip(self))]
    fn get_artifact(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
        include_test: bool,
    ) -> Result<Option<ResolvedArtifact>, StoreError> {
        match self.archive_file(group, artifact, version, include_test)? {
            Some(path) => {
                trace!(path = %path.display(), "Found artifact");
                let id = ArtifactId::new(group, artifact, version);
                Ok(Some(self.handle_for(id, &path, include_test)?))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, content), fields(size = content.len()))]
    fn create_artifact(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
        packaging: &str,
        content: &[u8],
        test: bool,
    ) -> Result<ResolvedArtifact, StoreError> {
        let dir = self.version_dir(group, artifact, version)?;

        // Content that is not an archive never reaches the repository
        let descriptor = embedded_descriptor(content, group, artifact)?;
        fs::create_dir_all(&dir)?;

        // The archive file marks the artifact as present, so it goes last
        let stem = Self::file_stem(artifact, version, test);
        if !test && let Some(descriptor) = descriptor {
            let descriptor_path = dir.join(format!("{}.{}", stem, DESCRIPTOR_EXTENSION));
            Self::write_atomically(&descriptor_path, &descriptor)?;
        }
        let path = dir.join(format!("{}.{}", stem, extension_for(packaging)));
        Self::write_atomically(&path, content)?;

        debug!(path = %path.display(), "Stored artifact");
        self.handle_for(ArtifactId::new(group, artifact, version), &path, test)
    }

    fn content(&self, artifact: &ResolvedArtifact) -> Result<ContentStream, StoreError> {
        let path = self
            .archive_file(artifact.group(), artifact.artifact(), artifact.version(), artifact.test)?
            .ok_or_else(|| StoreError::not_found(artifact.id.to_string()))?;
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }

    fn descriptor(&self, artifact: &ResolvedArtifact) -> Result<Option<ContentStream>, StoreError> {
        let dir = self.version_dir(artifact.group(), artifact.artifact(), artifact.version())?;
        let stem = Self::file_stem(artifact.artifact(), artifact.version(), false);
        let path = dir.join(format!("{}.{}", stem, DESCRIPTOR_EXTENSION));

        match File::open(&path) {
            Ok(file) => return Ok(Some(Box::new(BufReader::new(file)))),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let Some(archive) =
            self.archive_file(artifact.group(), artifact.artifact(), artifact.version(), false)?
        else {
            return Ok(None);
        };
        let content = fs::read(archive)?;
        Ok(embedded_descriptor(&content, artifact.group(), artifact.artifact())?
            .map(|bytes| Box::new(Cursor::new(bytes)) as ContentStream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rejects_path_escapes() {
        let dir = TempDir::new().unwrap();
        let repo = LocalRepository::open(dir.path()).unwrap();

        assert!(matches!(
            repo.get_artifact("com..acme", "a", "1", false),
            Err(StoreError::InvalidCoordinate(_))
        ));
        assert!(matches!(
            repo.get_artifact("com.acme", "../a", "1", false),
            Err(StoreError::InvalidCoordinate(_))
        ));
    }

    #[test]
    fn test_extension_for_packaging() {
        assert_eq!(extension_for("bundle"), "jar");
        assert_eq!(extension_for("war"), "war");
        assert_eq!(extension_for(""), "jar");
    }

    #[test]
    fn test_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let repo = LocalRepository::open(dir.path()).unwrap();
        assert!(repo.get_artifact("org.example", "widget", "1.0", false).unwrap().is_none());
        assert!(repo.list_versions("org.example", "widget").unwrap().is_empty());
        assert!(repo.list_groups().unwrap().is_empty());
    }
}
