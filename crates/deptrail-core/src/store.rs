//! The store gateway
//!
//! [`ArtifactStore`] is the narrow interface through which the resolver and
//! the closure walker reach an artifact repository. Implementations must be
//! safe to call from many threads at once.

use std::collections::BTreeSet;
use std::io::Read;

use crate::artifact::ResolvedArtifact;
use crate::error::StoreError;

/// Byte stream handed out by a store
pub type ContentStream = Box<dyn Read + Send>;

/// Gateway to an artifact repository
pub trait ArtifactStore: Send + Sync {
    /// All known groups, in order
    fn list_groups(&self) -> Result<BTreeSet<String>, StoreError>;

    /// All artifacts known within a group
    fn list_artifacts(&self, group: &str) -> Result<BTreeSet<String>, StoreError>;

    /// Known versions of an artifact in string order; the last one is the greatest
    fn list_versions(&self, group: &str, artifact: &str) -> Result<BTreeSet<String>, StoreError>;

    /// Look up an artifact
    fn get_artifact(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
        include_test: bool,
    ) -> Result<Option<ResolvedArtifact>, StoreError>;

    /// Persist new archive bytes as an artifact and return its handle
    ///
    /// Replaces an existing artifact with the same coordinate.
    fn create_artifact(
        &self,
        group: &str,
        artifact: &str,
        version: &str,
        packaging: &str,
        content: &[u8],
        test: bool,
    ) -> Result<ResolvedArtifact, StoreError>;

    /// Open the archive bytes of an artifact
    fn content(&self, artifact: &ResolvedArtifact) -> Result<ContentStream, StoreError>;

    /// Open the descriptor document of an artifact
    ///
    /// Returns `None` when the artifact carries no descriptor; such an
    /// artifact declares no dependencies.
    fn descriptor(&self, artifact: &ResolvedArtifact) -> Result<Option<ContentStream>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that the ArtifactStore trait is object-safe
    fn _assert_object_safe(_: &dyn ArtifactStore) {}
}
