//! Error types for deptrail-core

use thiserror::Error;

/// Errors raised by an [`ArtifactStore`](crate::ArtifactStore) implementation
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error while reading or persisting an artifact
    #[error("Store I/O error: {0}")]
    Io(String),

    /// Requested artifact was not found
    #[error("Artifact not found: {0}")]
    NotFound(String),

    /// The artifact archive could not be read
    #[error("Archive error: {0}")]
    Archive(String),

    /// A coordinate could not be mapped onto the store layout
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl StoreError {
    /// Create a new NotFound error
    pub fn not_found(item: impl Into<String>) -> Self {
        Self::NotFound(item.into())
    }

    /// Create a new I/O error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    /// Create a new Archive error
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive(message.into())
    }

    /// Create a new InvalidCoordinate error
    pub fn invalid_coordinate(message: impl Into<String>) -> Self {
        Self::InvalidCoordinate(message.into())
    }
}

/// Errors raised while decoding a dependency descriptor
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// The document is not well-formed or does not match the schema
    #[error("Malformed descriptor: {0}")]
    Malformed(String),

    /// A field required to identify the artifact is absent
    #[error("Descriptor is missing required field `{0}`")]
    MissingField(&'static str),

    /// The descriptor stream could not be read
    #[error("Descriptor I/O error: {0}")]
    Io(String),
}

impl From<quick_xml::DeError> for DescriptorError {
    fn from(err: quick_xml::DeError) -> Self {
        DescriptorError::Malformed(err.to_string())
    }
}

impl From<std::io::Error> for DescriptorError {
    fn from(err: std::io::Error) -> Self {
        DescriptorError::Io(err.to_string())
    }
}
