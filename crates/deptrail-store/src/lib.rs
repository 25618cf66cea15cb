//! # Deptrail Store
//!
//! Artifact store backends for deptrail.
//!
//! ## Features
//!
//! - **InMemoryArtifactStore**: DashMap-backed store for testing and embedding
//! - **LocalRepository**: On-disk store using the
//!   `group/path/artifact/version/artifact-version.ext` layout
//! - **embedded_descriptor**: Recovers a descriptor packed inside an archive
//!
//! ## Example
//!
//! ```rust,ignore
//! use deptrail_core::ArtifactStore;
//! use deptrail_store::LocalRepository;
//!
//! let repo = LocalRepository::open("/var/lib/deptrail/repository")?;
//! for version in repo.list_versions("org.example", "widget")? {
//!     println!("{}", version);
//! }
//! ```

pub mod embedded;
pub mod local;
pub mod memory;

// Re-exports
pub use embedded::{embedded_descriptor, embedded_descriptor_path};
pub use local::LocalRepository;
pub use memory::InMemoryArtifactStore;

// Re-export the gateway trait and its error from deptrail-core for convenience
pub use deptrail_core::{ArtifactStore, StoreError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backends_are_gateways() {
        fn assert_store<S: ArtifactStore>() {}
        assert_store::<InMemoryArtifactStore>();
        assert_store::<LocalRepository>();
    }
}
