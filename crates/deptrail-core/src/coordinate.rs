//! Artifact coordinates
//!
//! A coordinate identifies an artifact by `(group, artifact, version)`.
//! Declared coordinates may leave the version out or carry an unresolved
//! `${...}` placeholder; stored artifacts always have a concrete one.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Opening token of an unresolved property placeholder
pub const PLACEHOLDER_OPEN: &str = "${";

/// Version suffix marking a continuously updated artifact
pub const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Check whether a value still contains an unresolved `${...}` placeholder
pub fn has_placeholder(value: &str) -> bool {
    value.contains(PLACEHOLDER_OPEN)
}

/// Check whether a version names a snapshot
pub fn is_snapshot_version(version: &str) -> bool {
    version.ends_with(SNAPSHOT_SUFFIX)
}

/// A declared coordinate, possibly incomplete
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactCoordinate {
    pub group: String,
    pub artifact: String,
    pub version: Option<String>,
}

impl ArtifactCoordinate {
    /// Create a coordinate with a version
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: Some(version.into()),
        }
    }

    /// Create a coordinate without a version
    pub fn unversioned(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: None,
        }
    }

    /// Parse `group:artifact` or `group:artifact:version`
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.trim().split(':');
        let group = parts.next().filter(|s| !s.is_empty())?;
        let artifact = parts.next().filter(|s| !s.is_empty())?;
        let version = parts.next().filter(|s| !s.is_empty());
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            group: group.to_string(),
            artifact: artifact.to_string(),
            version: version.map(str::to_string),
        })
    }

    /// The group still needs to be inferred
    pub fn group_unresolved(&self) -> bool {
        has_placeholder(&self.group)
    }

    /// The version is absent or still carries a placeholder
    pub fn version_unresolved(&self) -> bool {
        self.version.as_deref().is_none_or(has_placeholder)
    }

    /// Convert to a concrete id if both group and version are resolved
    pub fn to_id(&self) -> Option<ArtifactId> {
        if self.group_unresolved() || self.version_unresolved() {
            return None;
        }
        let version = self.version.as_ref()?;
        Some(ArtifactId::new(&self.group, &self.artifact, version))
    }
}

impl Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}:{}:{}", self.group, self.artifact, version),
            None => write!(f, "{}:{}", self.group, self.artifact),
        }
    }
}

/// A fully concrete coordinate
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactId {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl ArtifactId {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }

    pub fn is_snapshot(&self) -> bool {
        is_snapshot_version(&self.version)
    }

    /// Resolution-path string naming `path` inside this artifact
    ///
    /// Format: `group/artifact/version/path`
    pub fn hit(&self, path: &str) -> String {
        format!("{}/{}/{}/{}", self.group, self.artifact, self.version, path)
    }

    /// Split a resolution-path string back into its artifact id and entry path
    pub fn split_hit(hit: &str) -> Option<(ArtifactId, &str)> {
        let mut parts = hit.splitn(4, '/');
        let group = parts.next().filter(|s| !s.is_empty())?;
        let artifact = parts.next().filter(|s| !s.is_empty())?;
        let version = parts.next().filter(|s| !s.is_empty())?;
        let path = parts.next().filter(|s| !s.is_empty())?;
        Some((ArtifactId::new(group, artifact, version), path))
    }

    /// Relative location of this artifact's file with the given extension
    ///
    /// Layout: `group/with/slashes/artifact/version/artifact-version.ext`
    pub fn relative_path(&self, extension: &str) -> String {
        format!(
            "{}/{}/{}/{}-{}.{}",
            self.group.replace('.', "/"),
            self.artifact,
            self.version,
            self.artifact,
            self.version,
            extension
        )
    }
}

impl Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

impl From<ArtifactId> for ArtifactCoordinate {
    fn from(id: ArtifactId) -> Self {
        Self {
            group: id.group,
            artifact: id.artifact,
            version: Some(id.version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_detection() {
        assert!(has_placeholder("${project.groupId}"));
        assert!(has_placeholder("1.${minor}"));
        assert!(!has_placeholder("1.0"));
        assert!(!has_placeholder("$1.0"));
    }

    #[test]
    fn test_version_unresolved() {
        assert!(ArtifactCoordinate::unversioned("g", "a").version_unresolved());
        assert!(ArtifactCoordinate::new("g", "a", "${v}").version_unresolved());
        assert!(!ArtifactCoordinate::new("g", "a", "1.0").version_unresolved());
    }

    #[test]
    fn test_parse_coordinate() {
        let coord = ArtifactCoordinate::parse("com.acme:widget:2.1").unwrap();
        assert_eq!(coord, ArtifactCoordinate::new("com.acme", "widget", "2.1"));

        let coord = ArtifactCoordinate::parse("com.acme:widget").unwrap();
        assert_eq!(coord.version, None);

        assert!(ArtifactCoordinate::parse("com.acme").is_none());
        assert!(ArtifactCoordinate::parse("a:b:c:d").is_none());
        assert!(ArtifactCoordinate::parse(":widget").is_none());
    }

    #[test]
    fn test_to_id_requires_resolution() {
        assert!(ArtifactCoordinate::new("${g}", "a", "1").to_id().is_none());
        assert!(ArtifactCoordinate::unversioned("g", "a").to_id().is_none());
        assert_eq!(
            ArtifactCoordinate::new("g", "a", "1").to_id(),
            Some(ArtifactId::new("g", "a", "1"))
        );
    }

    #[test]
    fn test_snapshot() {
        assert!(ArtifactId::new("g", "a", "1.0-SNAPSHOT").is_snapshot());
        assert!(!ArtifactId::new("g", "a", "1.0-snapshot").is_snapshot());
        assert!(!ArtifactId::new("g", "a", "1.0").is_snapshot());
    }

    #[test]
    fn test_hit_round_trip() {
        let id = ArtifactId::new("com.acme", "widget", "1.0");
        let hit = id.hit("META-INF/services/com.acme.Plugin");
        assert_eq!(hit, "com.acme/widget/1.0/META-INF/services/com.acme.Plugin");

        let (parsed, path) = ArtifactId::split_hit(&hit).unwrap();
        assert_eq!(parsed, id);
        assert_eq!(path, "META-INF/services/com.acme.Plugin");

        assert!(ArtifactId::split_hit("com.acme/widget/1.0").is_none());
    }

    #[test]
    fn test_relative_path() {
        let id = ArtifactId::new("org.example.tools", "lint", "3.2");
        assert_eq!(id.relative_path("jar"), "org/example/tools/lint/3.2/lint-3.2.jar");
    }
}
