//! In-memory artifact store
//!
//! Suitable for tests and for embedding a pre-populated repository.

use std::collections::BTreeSet;
use std::io::Cursor;

use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use deptrail_core::{ArtifactId, ArtifactStore, ContentStream, ResolvedArtifact, StoreError};
use tracing::{debug, trace};

use crate::embedded::embedded_descriptor;

#[derive(Debug, Clone)]
struct StoredArtifact {
    handle: ResolvedArtifact,
    content: Bytes,
    descriptor: Option<Bytes>,
}

/// In-memory implementation of [`ArtifactStore`]
///
/// Uses `DashMap` for concurrent access; keyed by artifact id and test flag.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    artifacts: DashMap<(ArtifactId, bool), StoredArtifact>,
}

impl InMemoryArtifactStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an artifact with an explicit descriptor document
    ///
    /// Without one, the descriptor embedded in the archive is used if present.
    pub fn insert(
        &self,
        id: ArtifactId,
        packaging: &str,
        content: impl Into<Bytes>,
        descriptor: Option<&str>,
    ) -> ResolvedArtifact {
        let content: Bytes = content.into();
        let descriptor = match descriptor {
            Some(xml) => Some(Bytes::copy_from_slice(xml.as_bytes())),
            None => embedded_descriptor(&content, &id.group, &id.artifact)
                .ok()
                .flatten()
                .map(Bytes::from),
        };
        let handle = ResolvedArtifact::new(id.clone(), packaging).with_last_modified(Utc::now());
        trace!(artifact = %id, "Inserting artifact");
        self.artifacts.insert(
            (id, false),
            StoredArtifact {
                handle: handle.clone(),
                content,
                descriptor,
            },
        );
        handle
    }

    /// Remove an artifact, returning whether it existed
    pub fn remove(&self, id: &ArtifactId, test: bool) -> bool {
        self.artifacts.remove(&(id.clone(), test)).is_some()
    }

    /// Number of stored artifacts
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    fn stored(&self, artifact: &ResolvedArtifact) -> Result<StoredArtifact, StoreError> {
        self.artifacts
            .get(&(artifact.id.clone(), artifact.test))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::not_found(artifact.id.to_string()))
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn list_groups(&self) -> Result<BTreeSet<String>, StoreError> {
        Ok(self
            .artifacts
            .iter()
            .map(|entry| entry.key().0.group.clone())
            .collect())
    }

    fn list_artifacts(&self, group: &str) -> Result<BTreeSet<String>, StoreError> {
        Ok(self
            .artifacts
            .iter()
            .filter(|entry| entry.key().0.group == group)
            .map(|entry| entry.key().0.artifact.clone())
            .collect())
    }

    fn list_versions(&self, group: &str, artifact: &str) -> Result<BTreeSet<String>, StoreError> {
        Ok(self
            .artifacts
            .iter()
            .filter(|entry| entry.key().0.group == group && entry.key().0.artifact == artifact)
            .map(|entry| entry.key().0.version.clone())
            .collect())
    }

    fn get_artifact(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
        include_test: bool,
    ) -> Result<Option<ResolvedArtifact>, StoreError> {
        let key = (ArtifactId::new(group, artifact, version), include_test);
        Ok(self.artifacts.get(&key).map(|entry| entry.handle.clone()))
    }

    fn create_artifact(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
        packaging: &str,
        content: &[u8],
        test: bool,
    ) -> Result<ResolvedArtifact, StoreError> {
        let id = ArtifactId::new(group, artifact, version);
        let descriptor = embedded_descriptor(content, group, artifact)?.map(Bytes::from);
        let handle = ResolvedArtifact::new(id.clone(), packaging)
            .with_test(test)
            .with_last_modified(Utc::now());

        debug!(artifact = %id, size = content.len(), "Created artifact");
        self.artifacts.insert(
            (id, test),
            StoredArtifact {
                handle: handle.clone(),
                content: Bytes::copy_from_slice(content),
                descriptor,
            },
        );
        Ok(handle)
    }

    fn content(&self, artifact: &ResolvedArtifact) -> Result<ContentStream, StoreError> {
        let stored = self.stored(artifact)?;
        Ok(Box::new(Cursor::new(stored.content)))
    }

    fn descriptor(&self, artifact: &ResolvedArtifact) -> Result<Option<ContentStream>, StoreError> {
        let stored = self.stored(artifact)?;
        Ok(stored
            .descriptor
            .map(|bytes| Box::new(Cursor::new(bytes)) as ContentStream))
    }
}
