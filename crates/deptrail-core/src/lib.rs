//! # Deptrail Core
//!
//! Core model, descriptor decoding and the store gateway for deptrail.
//!
//! This crate provides the value types shared by the resolver and the
//! storage backends, so that the same resolution logic works against an
//! in-memory store (for testing) and an on-disk local repository.
//!
//! ## Key Types
//!
//! - [`ArtifactCoordinate`]: A declared `(group, artifact, version?)` triple
//! - [`ArtifactId`]: A fully concrete coordinate of a stored artifact
//! - [`DependencyDeclaration`]: A dependency edge with scope, optionality and exclusions
//! - [`ExclusionRule`] / [`ExclusionSet`]: Wildcard-capable subtree filters
//! - [`Descriptor`]: The decoded dependency document of an artifact
//! - [`ResolvedArtifact`]: Handle to an artifact owned by a store
//!
//! ## Key Traits
//!
//! - [`ArtifactStore`]: The narrow gateway to an artifact repository

pub mod artifact;
pub mod coordinate;
pub mod declaration;
pub mod descriptor;
pub mod error;
pub mod store;

// Re-export main types
pub use artifact::*;
pub use coordinate::*;
pub use declaration::*;
pub use descriptor::*;
pub use error::*;
pub use store::*;
