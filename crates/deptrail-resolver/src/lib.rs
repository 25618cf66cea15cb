//! # Deptrail Resolver
//!
//! Dependency resolution and transitive resource lookup over an
//! [`ArtifactStore`](deptrail_core::ArtifactStore).
//!
//! ## Components
//!
//! - [`DependencyResolver`]: Resolves one declaration to a stored artifact,
//!   inferring placeholders and fetching from remote endpoints
//! - [`RemoteFetcher`] / [`HttpFetcher`]: Blocking byte source for remote
//!   artifact locations
//! - [`ArchiveIndex`]: Per-artifact entry index, scanned once and shared
//! - [`ClosureWalker`]: Finds every artifact in a dependency closure that
//!   contains a resource path
//!
//! All components are safe to share between threads.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use deptrail_resolver::{ClosureWalker, DependencyResolver, HttpFetcher, MatchMode};
//! use deptrail_store::LocalRepository;
//!
//! let config = DeptrailConfig::load("deptrail.toml")?;
//! let store = Arc::new(LocalRepository::open("/var/lib/deptrail/repository")?);
//! let fetcher = Arc::new(HttpFetcher::new(&config.resolver)?);
//! let resolver = Arc::new(DependencyResolver::new(store, fetcher, config.resolver));
//! let walker = ClosureWalker::new(resolver, config.walker);
//!
//! for hit in walker.find_all(&root, "com/acme/Widget.class", MatchMode::AllMatches)?.iter() {
//!     println!("{}", hit);
//! }
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod fetch;
pub mod resolver;
pub mod walker;

// Re-exports
pub use archive::{ArchiveIndex, EntryIndex, normalize_entry};
pub use config::{DEFAULT_BLACKLIST, DeptrailConfig, ResolverConfig, WalkerConfig};
pub use error::{
    ArchiveError, ConfigError, DeptrailError, DeptrailResult, FetchError, ResolveError, WalkError,
};
pub use fetch::{HttpFetcher, RemoteFetcher, artifact_url};
pub use resolver::{DependencyOutcome, DependencyResolver};
pub use walker::{ClosureWalker, MatchMode};
