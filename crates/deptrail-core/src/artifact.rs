//! Handles to stored artifacts

use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coordinate::ArtifactId;

/// Packaging used when none is known
pub const DEFAULT_PACKAGING: &str = "jar";

/// An artifact held by an [`ArtifactStore`](crate::ArtifactStore)
///
/// The handle is cheap to clone; content and descriptor bytes are read
/// through the owning store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedArtifact {
    pub id: ArtifactId,
    pub packaging: String,
    /// Whether this is the test variant of the artifact
    pub test: bool,
    pub last_modified: Option<DateTime<Utc>>,
}

impl ResolvedArtifact {
    pub fn new(id: ArtifactId, packaging: impl Into<String>) -> Self {
        Self {
            id,
            packaging: packaging.into(),
            test: false,
            last_modified: None,
        }
    }

    pub fn with_test(mut self, test: bool) -> Self {
        self.test = test;
        self
    }

    pub fn with_last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }

    pub fn group(&self) -> &str {
        &self.id.group
    }

    pub fn artifact(&self) -> &str {
        &self.id.artifact
    }

    pub fn version(&self) -> &str {
        &self.id.version
    }

    pub fn is_snapshot(&self) -> bool {
        self.id.is_snapshot()
    }
}

impl Display for ResolvedArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)?;
        if self.test {
            write!(f, " (test)")?;
        }
        Ok(())
    }
}
