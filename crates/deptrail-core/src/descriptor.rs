//! Dependency descriptor documents
//!
//! A descriptor is the XML document stored next to an artifact that names
//! the artifact and lists its direct dependencies:
//!
//! ```text
//! <project>
//!   <groupId>..</groupId> <artifactId>..</artifactId> <version>..</version>
//!   <parent> groupId / artifactId / version </parent>
//!   <dependencies>
//!     <dependency> groupId / artifactId / version? / scope? / optional?
//!       <exclusions><exclusion> groupId / artifactId </exclusion></exclusions>
//!     </dependency>
//!   </dependencies>
//!   <exclusions><exclusion> groupId / artifactId </exclusion></exclusions>
//! </project>
//! ```
//!
//! Elements outside this schema (build sections, managed dependencies,
//! plugins, namespace attributes) are ignored.

use std::io::{BufReader, Read};

use serde::Deserialize;

use crate::coordinate::{ArtifactCoordinate, ArtifactId};
use crate::declaration::{DependencyDeclaration, ExclusionRule, Scope};
use crate::error::DescriptorError;

/// Decoded descriptor of one artifact
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Descriptor {
    pub group: Option<String>,
    pub artifact: String,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<ArtifactCoordinate>,
    /// Direct dependencies in declaration order
    pub dependencies: Vec<DependencyDeclaration>,
    /// Top-level exclusions applied to every dependency below this artifact
    pub exclusions: Vec<ExclusionRule>,
}

impl Descriptor {
    /// Decode a descriptor from an XML string
    pub fn from_xml(xml: &str) -> Result<Self, DescriptorError> {
        let raw: RawProject = quick_xml::de::from_str(xml)?;
        raw.into_descriptor()
    }

    /// Decode a descriptor from a byte stream
    pub fn from_reader(reader: impl Read) -> Result<Self, DescriptorError> {
        let mut xml = String::new();
        BufReader::new(reader).read_to_string(&mut xml)?;
        Self::from_xml(&xml)
    }

    /// Group of this artifact, inherited from the parent when not declared
    pub fn effective_group(&self) -> Option<&str> {
        self.group
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|p| p.group.as_str()))
    }

    /// Version of this artifact, inherited from the parent when not declared
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or_else(|| self.parent.as_ref().and_then(|p| p.version.as_deref()))
    }

    /// Concrete id of the described artifact, if fully determined
    pub fn id(&self) -> Option<ArtifactId> {
        Some(ArtifactId::new(
            self.effective_group()?,
            self.artifact.clone(),
            self.effective_version()?,
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProject {
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
    packaging: Option<String>,
    parent: Option<RawArtifact>,
    dependencies: Option<RawDependencies>,
    exclusions: Option<RawExclusions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDependencies {
    #[serde(default)]
    dependency: Vec<RawDependency>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDependency {
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
    scope: Option<String>,
    optional: Option<String>,
    exclusions: Option<RawExclusions>,
}

#[derive(Debug, Default, Deserialize)]
struct RawExclusions {
    #[serde(default)]
    exclusion: Vec<RawArtifact>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl RawProject {
    fn into_descriptor(self) -> Result<Descriptor, DescriptorError> {
        let artifact = clean(self.artifact_id).ok_or(DescriptorError::MissingField("artifactId"))?;

        let parent = match self.parent {
            Some(raw) => Some(ArtifactCoordinate {
                group: clean(raw.group_id).ok_or(DescriptorError::MissingField("parent/groupId"))?,
                artifact: clean(raw.artifact_id)
                    .ok_or(DescriptorError::MissingField("parent/artifactId"))?,
                version: clean(raw.version),
            }),
            None => None,
        };

        let dependencies = self
            .dependencies
            .unwrap_or_default()
            .dependency
            .into_iter()
            .map(RawDependency::into_declaration)
            .collect::<Result<Vec<_>, _>>()?;

        let exclusions = self.exclusions.unwrap_or_default().into_rules()?;

        Ok(Descriptor {
            group: clean(self.group_id),
            artifact,
            version: clean(self.version),
            packaging: clean(self.packaging),
            parent,
            dependencies,
            exclusions,
        })
    }
}

impl RawDependency {
    fn into_declaration(self) -> Result<DependencyDeclaration, DescriptorError> {
        let group = clean(self.group_id).ok_or(DescriptorError::MissingField("dependency/groupId"))?;
        let artifact =
            clean(self.artifact_id).ok_or(DescriptorError::MissingField("dependency/artifactId"))?;
        let optional = match clean(self.optional).as_deref() {
            None | Some("false") => false,
            Some("true") => true,
            Some(other) => {
                return Err(DescriptorError::Malformed(format!(
                    "dependency {}:{} has invalid optional flag `{}`",
                    group, artifact, other
                )));
            }
        };

        Ok(DependencyDeclaration {
            coordinate: ArtifactCoordinate {
                group,
                artifact,
                version: clean(self.version),
            },
            scope: Scope::parse(clean(self.scope).as_deref()),
            optional,
            exclusions: self.exclusions.unwrap_or_default().into_rules()?,
        })
    }
}

impl RawExclusions {
    fn into_rules(self) -> Result<Vec<ExclusionRule>, DescriptorError> {
        self.exclusion
            .into_iter()
            .map(|raw| {
                Ok(ExclusionRule {
                    group: clean(raw.group_id)
                        .ok_or(DescriptorError::MissingField("exclusion/groupId"))?,
                    artifact: clean(raw.artifact_id)
                        .ok_or(DescriptorError::MissingField("exclusion/artifactId"))?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
    <modelVersion>4.0.0</modelVersion>
    <groupId>be.example.libs</groupId>
    <artifactId>artifacts-core</artifactId>
    <version>1.0-SNAPSHOT</version>
</project>"#;

    #[test]
    fn test_parse_identity() {
        let descriptor = Descriptor::from_xml(SIMPLE).unwrap();
        assert_eq!(descriptor.group.as_deref(), Some("be.example.libs"));
        assert_eq!(descriptor.artifact, "artifacts-core");
        assert_eq!(descriptor.version.as_deref(), Some("1.0-SNAPSHOT"));
        assert!(descriptor.dependencies.is_empty());
        assert!(descriptor.exclusions.is_empty());
    }

    #[test]
    fn test_parent_inheritance() {
        let xml = r#"<project>
            <parent>
                <groupId>org.example</groupId>
                <artifactId>parent</artifactId>
                <version>7</version>
            </parent>
            <artifactId>child</artifactId>
        </project>"#;
        let descriptor = Descriptor::from_xml(xml).unwrap();
        assert_eq!(descriptor.group, None);
        assert_eq!(descriptor.effective_group(), Some("org.example"));
        assert_eq!(descriptor.effective_version(), Some("7"));
        assert_eq!(descriptor.id(), Some(ArtifactId::new("org.example", "child", "7")));
    }

    #[test]
    fn test_missing_artifact_id() {
        let err = Descriptor::from_xml("<project><groupId>g</groupId></project>").unwrap_err();
        assert!(matches!(err, DescriptorError::MissingField("artifactId")));
    }

    #[test]
    fn test_malformed_document() {
        let err = Descriptor::from_xml("<project><artifactId>a</project>").unwrap_err();
        assert!(matches!(err, DescriptorError::Malformed(_)));
    }

    #[test]
    fn test_invalid_optional_flag() {
        let xml = r#"<project><artifactId>a</artifactId>
            <dependencies><dependency>
                <groupId>g</groupId><artifactId>b</artifactId><optional>maybe</optional>
            </dependency></dependencies>
        </project>"#;
        assert!(matches!(
            Descriptor::from_xml(xml).unwrap_err(),
            DescriptorError::Malformed(_)
        ));
    }
}
