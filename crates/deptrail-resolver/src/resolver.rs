//! Dependency resolution
//!
//! [`DependencyResolver::resolve`] turns one declaration into a concrete
//! artifact of the store:
//!
//! 1. A `${...}` group is inferred from the first store group that knows
//!    the artifact.
//! 2. Ignored coordinates resolve to nothing without touching the store.
//! 3. A missing or `${...}` version becomes the greatest known version in
//!    string order (not semantic order).
//! 4. Missing artifacts, and snapshots not yet refreshed during this
//!    resolver's lifetime, are fetched from the endpoints in order. The
//!    first endpoint that delivers wins; failures fall through to the next.
//!
//! Declarations are never modified. The returned artifact carries the
//! inferred group and selected version.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::{DashMap, DashSet};
use deptrail_core::{
    ArtifactId, ArtifactStore, DependencyDeclaration, Descriptor, ResolvedArtifact, Scope,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::config::ResolverConfig;
use crate::error::{FetchError, ResolveError};
use crate::fetch::{RemoteFetcher, artifact_url};

/// Identity of a refresh attempt
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RefreshKey {
    id: ArtifactId,
    scope: Scope,
}

/// Result of resolving one direct dependency of an artifact
#[derive(Debug, Clone)]
pub struct DependencyOutcome {
    pub declaration: DependencyDeclaration,
    pub resolved: Option<ResolvedArtifact>,
}

/// Resolves declarations against a store, fetching from remote endpoints
pub struct DependencyResolver {
    store: Arc<dyn ArtifactStore>,
    fetcher: Arc<dyn RemoteFetcher>,
    config: ResolverConfig,
    ignored: HashSet<String>,
    /// Refreshes already attempted, whatever their outcome
    attempted: DashSet<RefreshKey>,
    /// Per-artifact turn taking for fetches of missing artifacts
    refreshing: DashMap<ArtifactId, Arc<Mutex<()>>>,
}

impl DependencyResolver {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        fetcher: Arc<dyn RemoteFetcher>,
        config: ResolverConfig,
    ) -> Self {
        let ignored = config.ignored.iter().map(|c| c.trim().to_string()).collect();
        Self {
            store,
            fetcher,
            config,
            ignored,
            attempted: DashSet::new(),
            refreshing: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Check whether `group` or `group:artifact` is on the ignore list
    pub fn is_ignored(&self, group: &str, artifact: &str) -> bool {
        self.ignored.contains(group) || self.ignored.contains(&format!("{}:{}", group, artifact))
    }

    /// Resolve a declaration to a stored artifact
    ///
    /// Returns `Ok(None)` when the coordinate is ignored, optional and
    /// absent, or still absent after every endpoint was tried.
    #[instrument(skip(self, declaration), fields(dependency = %declaration))]
    pub fn resolve(
        &self,
        declaration: &DependencyDeclaration,
    ) -> Result<Option<ResolvedArtifact>, ResolveError> {
        let artifact = declaration.artifact();

        let group = if declaration.coordinate.group_unresolved() {
            match self.infer_group(artifact)? {
                Some(group) => group,
                None if declaration.optional => return Ok(None),
                None => return Err(ResolveError::unresolved(declaration.coordinate.to_string())),
            }
        } else {
            declaration.group().to_string()
        };

        if self.is_ignored(&group, artifact) {
            trace!(group = %group, artifact, "Ignored coordinate");
            return Ok(None);
        }

        let version = if declaration.coordinate.version_unresolved() {
            let versions = self.store.list_versions(&group, artifact)?;
            match versions.last() {
                Some(version) => version.clone(),
                None => {
                    debug!(group = %group, artifact, "No known version");
                    return Ok(None);
                }
            }
        } else {
            match declaration.version() {
                Some(version) => version.to_string(),
                None => return Ok(None),
            }
        };

        let current = self.store.get_artifact(&group, artifact, &version, false)?;
        if current.is_none() && declaration.optional {
            return Ok(None);
        }

        let key = RefreshKey {
            id: ArtifactId::new(&group, artifact, &version),
            scope: declaration.scope.clone(),
        };
        let Some(candidate) = current else {
            return self.fetch_missing(key);
        };
        if !candidate.is_snapshot() || !self.config.update_snapshots {
            return Ok(Some(candidate));
        }
        // Claim the refresh; a concurrent or earlier caller may own it
        if !self.attempted.insert(key.clone()) {
            return Ok(Some(candidate));
        }
        info!(group = %group, artifact, version = %version, "Checking for snapshot updates");
        Ok(Some(self.fetch_from_endpoints(&key.id).unwrap_or(candidate)))
    }

    /// Fetch an artifact the store does not hold
    ///
    /// Callers for the same artifact take turns. A caller that finds the
    /// artifact stored by the previous one returns it without fetching.
    fn fetch_missing(&self, key: RefreshKey) -> Result<Option<ResolvedArtifact>, ResolveError> {
        let lock = self.refreshing.entry(key.id.clone()).or_default().clone();
        let _turn = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let id = &key.id;
        if let Some(stored) = self.store.get_artifact(&id.group, &id.artifact, &id.version, false)? {
            trace!(artifact = %id, "Stored by a concurrent resolution");
            return Ok(Some(stored));
        }

        info!(group = %id.group, artifact = %id.artifact, version = %id.version, "Dependency missing locally");
        self.attempted.insert(key.clone());
        Ok(self.fetch_from_endpoints(id))
    }

    /// Resolve every direct dependency declared by an artifact
    ///
    /// Dependencies that cannot be found are reported and returned without
    /// a resolved artifact.
    #[instrument(skip(self, artifact), fields(artifact = %artifact))]
    pub fn resolve_descriptor(
        &self,
        artifact: &ResolvedArtifact,
    ) -> Result<Vec<DependencyOutcome>, ResolveError> {
        let Some(descriptor) = self.descriptor(artifact)? else {
            return Ok(Vec::new());
        };

        let mut outcomes = Vec::with_capacity(descriptor.dependencies.len());
        for declaration in descriptor.dependencies {
            let resolved = match self.resolve(&declaration) {
                Ok(resolved) => resolved,
                Err(ResolveError::UnresolvedCoordinate(coordinate)) => {
                    warn!(owner = %artifact.id, coordinate = %coordinate, "Cannot infer dependency coordinate");
                    None
                }
                Err(e) => return Err(e),
            };
            if resolved.is_none() {
                warn!(owner = %artifact.id, dependency = %declaration, "Dependency does not exist");
            }
            outcomes.push(DependencyOutcome {
                declaration,
                resolved,
            });
        }
        Ok(outcomes)
    }

    /// Decode the descriptor of an artifact, if it has one
    pub fn descriptor(&self, artifact: &ResolvedArtifact) -> Result<Option<Descriptor>, ResolveError> {
        let Some(stream) = self.store.descriptor(artifact)? else {
            trace!(artifact = %artifact.id, "Artifact has no descriptor");
            return Ok(None);
        };
        Descriptor::from_reader(stream)
            .map(Some)
            .map_err(|source| ResolveError::Descriptor {
                artifact: artifact.id.to_string(),
                source,
            })
    }

    fn infer_group(&self, artifact: &str) -> Result<Option<String>, ResolveError> {
        for group in self.store.list_groups()? {
            if self.store.list_artifacts(&group)?.contains(artifact) {
                debug!(group = %group, artifact, "Inferred group");
                return Ok(Some(group));
            }
        }
        Ok(None)
    }

    /// Try each endpoint in order and persist the first archive delivered
    fn fetch_from_endpoints(&self, id: &ArtifactId) -> Option<ResolvedArtifact> {
        for endpoint in &self.config.endpoints {
            match self.fetch_from(endpoint, id) {
                Ok(created) => {
                    info!(artifact = %id, endpoint = %endpoint, "Retrieved artifact");
                    return Some(created);
                }
                Err(e) => warn!(artifact = %id, endpoint = %endpoint, error = %e, "Endpoint failed"),
            }
        }
        if !self.config.endpoints.is_empty() {
            warn!(artifact = %id, "No endpoint could deliver the artifact");
        }
        None
    }

    fn fetch_from(&self, endpoint: &url::Url, id: &ArtifactId) -> Result<ResolvedArtifact, FetchError> {
        let url = artifact_url(endpoint, id, &self.config.packaging)?;
        info!(url = %url, "Trying to retrieve artifact");
        let bytes = self.fetcher.fetch(&url)?;
        self.store
            .create_artifact(
                &id.group,
                &id.artifact,
                &id.version,
                &self.config.packaging,
                &bytes,
                false,
            )
            .map_err(|e| FetchError::transport(url.as_str(), e.to_string()))
    }
}
