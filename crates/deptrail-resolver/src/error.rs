//! Error types for deptrail-resolver
//!
//! Per-endpoint [`FetchError`]s are always absorbed by the resolver. Only
//! unresolvable mandatory dependencies, malformed descriptors and store
//! failures reach the caller of a walk.

use deptrail_core::{DescriptorError, StoreError};
use thiserror::Error;

/// Errors raised while resolving a single declaration
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A group placeholder could not be inferred for a mandatory declaration
    #[error("Cannot infer coordinate for {0}")]
    UnresolvedCoordinate(String),

    /// The descriptor of an artifact could not be decoded
    #[error("Malformed descriptor of {artifact}: {source}")]
    Descriptor {
        artifact: String,
        #[source]
        source: DescriptorError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResolveError {
    /// Create a new UnresolvedCoordinate error
    pub fn unresolved(coordinate: impl Into<String>) -> Self {
        Self::UnresolvedCoordinate(coordinate.into())
    }
}

/// Errors raised by a single remote endpoint
#[derive(Debug, Error)]
pub enum FetchError {
    /// The artifact location could not be built from the endpoint
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be configured
    #[error("HTTP client error: {0}")]
    Client(String),

    /// Connection or transfer failure
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// The endpoint answered with a non-success status
    #[error("Endpoint returned status {status} for {url}")]
    Status { url: String, status: u16 },
}

impl FetchError {
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }
}

impl From<url::ParseError> for FetchError {
    fn from(err: url::ParseError) -> Self {
        FetchError::InvalidUrl(err.to_string())
    }
}

/// Errors raised by the archive index
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// An entry was extracted from an artifact that was never indexed
    #[error("Artifact {0} has not been scanned yet")]
    NotScanned(String),

    /// The indexed artifact does not contain the entry
    #[error("Entry `{path}` not found in {artifact}")]
    EntryNotFound { artifact: String, path: String },

    /// The archive could not be read
    #[error("Corrupt archive {artifact}: {message}")]
    Corrupt { artifact: String, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ArchiveError {
    pub fn corrupt(artifact: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            artifact: artifact.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while walking a dependency closure
#[derive(Debug, Error)]
pub enum WalkError {
    /// A mandatory dependency could not be resolved; aborts the whole walk
    #[error("Cannot resolve dependency {dependency} of {owner}")]
    UnresolvableDependency { dependency: String, owner: String },

    /// The descriptor of an artifact in the closure could not be decoded
    #[error("Malformed descriptor of {artifact}: {source}")]
    MalformedDescriptor {
        artifact: String,
        #[source]
        source: DescriptorError,
    },

    /// A group placeholder could not be inferred for a mandatory dependency
    #[error("Cannot infer coordinate for {0}")]
    UnresolvedCoordinate(String),

    /// A resolution-path string does not name an artifact entry
    #[error("Invalid resolution path: {0}")]
    InvalidHit(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

impl From<ResolveError> for WalkError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::UnresolvedCoordinate(coordinate) => {
                WalkError::UnresolvedCoordinate(coordinate)
            }
            ResolveError::Descriptor { artifact, source } => {
                WalkError::MalformedDescriptor { artifact, source }
            }
            ResolveError::Store(e) => WalkError::Store(e),
        }
    }
}

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read configuration {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid configuration: {0}")]
    Parse(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Top-level error type for the resolver crate
#[derive(Debug, Error)]
pub enum DeptrailError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type alias using DeptrailError
pub type DeptrailResult<T> = Result<T, DeptrailError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_maps_into_walk_error() {
        let err: WalkError = ResolveError::unresolved("${g}:widget").into();
        assert!(matches!(err, WalkError::UnresolvedCoordinate(_)));

        let err: WalkError = ResolveError::Descriptor {
            artifact: "g:a:1".to_string(),
            source: DescriptorError::Malformed("eof".to_string()),
        }
        .into();
        assert!(matches!(err, WalkError::MalformedDescriptor { .. }));
        assert!(err.to_string().contains("g:a:1"));
    }

    #[test]
    fn test_error_display() {
        let err = WalkError::UnresolvableDependency {
            dependency: "com.acme:gears:2.0".to_string(),
            owner: "com.acme:widget:1.0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot resolve dependency com.acme:gears:2.0 of com.acme:widget:1.0"
        );

        let err = ArchiveError::NotScanned("g:a:1".to_string());
        assert!(err.to_string().contains("not been scanned"));

        let err = FetchError::Status {
            url: "https://repo.example/a.jar".to_string(),
            status: 404,
        };
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_store_error_conversion() {
        let err: DeptrailError = StoreError::not_found("g:a:1").into();
        assert!(matches!(err, DeptrailError::Store(StoreError::NotFound(_))));
    }
}
