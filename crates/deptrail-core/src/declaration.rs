//! Dependency declarations and exclusion rules

use std::fmt::Display;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::coordinate::ArtifactCoordinate;

/// Wildcard accepted in exclusion rules
pub const WILDCARD: &str = "*";

/// Visibility classification of a dependency
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Scope {
    /// No scope declared (behaves like compile)
    #[default]
    Unspecified,
    Compile,
    Runtime,
    Test,
    /// Supplied by the embedding environment
    Provided,
    System,
    /// Any other declared scope name
    Other(String),
}

impl Scope {
    /// Map a declared scope string onto a scope
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Scope::Unspecified,
            Some("compile") => Scope::Compile,
            Some("runtime") => Scope::Runtime,
            Some("test") => Scope::Test,
            Some("provided") => Scope::Provided,
            Some("system") => Scope::System,
            Some(other) => Scope::Other(other.to_string()),
        }
    }

    /// Only unspecified, compile and runtime dependencies are followed;
    /// every other scope marks its coordinate as externally provided.
    pub fn is_suppressing(&self) -> bool {
        !matches!(self, Scope::Unspecified | Scope::Compile | Scope::Runtime)
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Unspecified => write!(f, "unspecified"),
            Scope::Compile => write!(f, "compile"),
            Scope::Runtime => write!(f, "runtime"),
            Scope::Test => write!(f, "test"),
            Scope::Provided => write!(f, "provided"),
            Scope::System => write!(f, "system"),
            Scope::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Filter removing a coordinate from a dependency subtree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExclusionRule {
    pub group: String,
    pub artifact: String,
}

impl ExclusionRule {
    pub fn new(group: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
        }
    }

    /// Check whether this rule removes the given coordinate
    ///
    /// A wildcard group matches everything; otherwise the group must be
    /// equal and the artifact must be equal or a wildcard.
    pub fn matches(&self, group: &str, artifact: &str) -> bool {
        if self.group == WILDCARD {
            return true;
        }
        self.group == group && (self.artifact == WILDCARD || self.artifact == artifact)
    }
}

impl Display for ExclusionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.group, self.artifact)
    }
}

/// Immutable set of exclusion rules carried down one branch of a walk
///
/// Extending a set never mutates it: [`ExclusionSet::extend`] returns a new
/// set and leaves the original shared with sibling branches untouched.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    rules: Arc<Vec<ExclusionRule>>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a set containing these rules plus `extra`
    pub fn extend(&self, extra: &[ExclusionRule]) -> Self {
        if extra.is_empty() {
            return self.clone();
        }
        let mut rules = Vec::with_capacity(self.rules.len() + extra.len());
        rules.extend(self.rules.iter().cloned());
        rules.extend(extra.iter().cloned());
        Self {
            rules: Arc::new(rules),
        }
    }

    pub fn excludes(&self, group: &str, artifact: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(group, artifact))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExclusionRule> {
        self.rules.iter()
    }
}

/// A requested dependency edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDeclaration {
    pub coordinate: ArtifactCoordinate,
    pub scope: Scope,
    pub optional: bool,
    pub exclusions: Vec<ExclusionRule>,
}

impl DependencyDeclaration {
    /// Create a mandatory declaration with no declared scope
    pub fn new(coordinate: ArtifactCoordinate) -> Self {
        Self {
            coordinate,
            scope: Scope::Unspecified,
            optional: false,
            exclusions: Vec::new(),
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_exclusion(mut self, rule: ExclusionRule) -> Self {
        self.exclusions.push(rule);
        self
    }

    pub fn group(&self) -> &str {
        &self.coordinate.group
    }

    pub fn artifact(&self) -> &str {
        &self.coordinate.artifact
    }

    pub fn version(&self) -> Option<&str> {
        self.coordinate.version.as_deref()
    }

    /// Key used for provided-set membership: `group/artifact`
    pub fn provided_key(&self) -> String {
        provided_key(self.group(), self.artifact())
    }
}

impl Display for DependencyDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.coordinate)?;
        if self.scope != Scope::Unspecified {
            write!(f, " ({})", self.scope)?;
        }
        if self.optional {
            write!(f, " [optional]")?;
        }
        Ok(())
    }
}

/// Provided-set key for a group and artifact
pub fn provided_key(group: &str, artifact: &str) -> String {
    format!("{}/{}", group, artifact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_parse() {
        assert_eq!(Scope::parse(None), Scope::Unspecified);
        assert_eq!(Scope::parse(Some(" runtime ")), Scope::Runtime);
        assert_eq!(Scope::parse(Some("provided")), Scope::Provided);
        assert_eq!(Scope::parse(Some("import")), Scope::Other("import".to_string()));
    }

    #[test]
    fn test_scope_suppression() {
        assert!(!Scope::Unspecified.is_suppressing());
        assert!(!Scope::Compile.is_suppressing());
        assert!(!Scope::Runtime.is_suppressing());
        assert!(Scope::Provided.is_suppressing());
        assert!(Scope::System.is_suppressing());
        assert!(Scope::Test.is_suppressing());
        assert!(Scope::Other("import".into()).is_suppressing());
    }

    #[test]
    fn test_exclusion_exact_match() {
        let rule = ExclusionRule::new("com.x", "core");
        assert!(rule.matches("com.x", "core"));
        assert!(!rule.matches("com.x", "util"));
        assert!(!rule.matches("com.y", "core"));
    }

    #[test]
    fn test_exclusion_artifact_wildcard() {
        let rule = ExclusionRule::new("com.x", "*");
        assert!(rule.matches("com.x", "core"));
        assert!(rule.matches("com.x", "util"));
        assert!(!rule.matches("com.xy", "core"));
    }

    #[test]
    fn test_exclusion_group_wildcard() {
        let rule = ExclusionRule::new("*", "*");
        assert!(rule.matches("anything", "at-all"));
    }

    #[test]
    fn test_exclusion_set_copy_on_write() {
        let parent = ExclusionSet::new().extend(&[ExclusionRule::new("com.x", "*")]);
        let child = parent.extend(&[ExclusionRule::new("org.y", "lib")]);

        assert_eq!(parent.len(), 1);
        assert_eq!(child.len(), 2);
        assert!(child.excludes("org.y", "lib"));
        assert!(!parent.excludes("org.y", "lib"));
        assert!(parent.excludes("com.x", "anything"));
    }

    #[test]
    fn test_declaration_display() {
        let decl = DependencyDeclaration::new(ArtifactCoordinate::new("g", "a", "1"))
            .with_scope(Scope::Provided)
            .with_optional(true);
        assert_eq!(decl.to_string(), "g:a:1 (provided) [optional]");
        assert_eq!(decl.provided_key(), "g/a");
    }
}
