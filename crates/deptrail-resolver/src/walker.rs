//! Transitive closure walker
//!
//! Answers "which artifacts in the dependency closure of a root contain
//! this resource path". Every answer is a list of resolution-path strings
//! `group/artifact/version/path`, ordered by declaration order and depth.
//!
//! Each level of the walk runs in two passes. The first pass checks the
//! direct dependencies for the path. The second descends into them, unless
//! a first-match query already found something at this level. Exclusion
//! rules and provided markings are carried per branch and never leak into
//! sibling branches.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use deptrail_core::{
    ArtifactCoordinate, ArtifactId, DependencyDeclaration, Descriptor, ExclusionSet,
    ResolvedArtifact, StoreError, provided_key,
};
use once_cell::sync::OnceCell;
use tracing::{debug, instrument, trace, warn};

use crate::archive::ArchiveIndex;
use crate::config::WalkerConfig;
use crate::error::WalkError;
use crate::resolver::DependencyResolver;

/// How many hits a query collects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// Stop at the shallowest level that produced a hit
    FirstMatch,
    /// Collect hits from the whole closure
    AllMatches,
}

type QueryKey = (ArtifactId, String, MatchMode);

/// Filters carried down one branch of the walk
struct Branch {
    exclusions: ExclusionSet,
    /// Provided keys (`group/artifact`) suppressed in this branch
    provided: HashSet<String>,
}

/// Walks dependency closures looking for resource paths
pub struct ClosureWalker {
    resolver: Arc<DependencyResolver>,
    archives: ArchiveIndex,
    descriptors: DashMap<ArtifactId, Arc<OnceCell<Option<Arc<Descriptor>>>>>,
    hits: DashMap<QueryKey, Arc<OnceCell<Arc<Vec<String>>>>>,
    blacklist: HashSet<String>,
    provided: DashSet<String>,
}

impl ClosureWalker {
    pub fn new(resolver: Arc<DependencyResolver>, config: WalkerConfig) -> Self {
        let provided = DashSet::new();
        for coordinate in &config.provided {
            match ArtifactCoordinate::parse(coordinate) {
                Some(c) => {
                    provided.insert(provided_key(&c.group, &c.artifact));
                }
                None => warn!(coordinate = %coordinate, "Ignoring malformed provided coordinate"),
            }
        }

        Self {
            archives: ArchiveIndex::new(resolver.store().clone()),
            resolver,
            descriptors: DashMap::new(),
            hits: DashMap::new(),
            blacklist: config.blacklist.into_iter().collect(),
            provided,
        }
    }

    pub fn resolver(&self) -> &DependencyResolver {
        &self.resolver
    }

    pub fn archives(&self) -> &ArchiveIndex {
        &self.archives
    }

    /// Mark a coordinate as supplied by the embedding environment
    ///
    /// Applies to every later walk; memoized answers are discarded.
    pub fn add_provided(&self, group: &str, artifact: &str) {
        self.provided.insert(provided_key(group, artifact));
        self.hits.clear();
    }

    /// Find every artifact in the closure of `root` containing `path`
    ///
    /// Answers are computed once per `(root, path, mode)` and shared.
    #[instrument(skip(self, root), fields(root = %root.id))]
    pub fn find_all(
        &self,
        root: &ResolvedArtifact,
        path: &str,
        mode: MatchMode,
    ) -> Result<Arc<Vec<String>>, WalkError> {
        let key = (root.id.clone(), path.to_string(), mode);
        let cell = self.hits.entry(key).or_default().clone();
        cell.get_or_try_init(|| self.collect(root, path, mode).map(Arc::new))
            .cloned()
    }

    /// First hit of a first-match query
    pub fn find_first(&self, root: &ResolvedArtifact, path: &str) -> Result<Option<String>, WalkError> {
        Ok(self.find_all(root, path, MatchMode::FirstMatch)?.first().cloned())
    }

    /// Read the bytes named by a resolution-path string
    ///
    /// The artifact must already have been scanned by a query.
    pub fn read_resource(&self, hit: &str) -> Result<Vec<u8>, WalkError> {
        let (id, path) =
            ArtifactId::split_hit(hit).ok_or_else(|| WalkError::InvalidHit(hit.to_string()))?;
        let artifact = self
            .resolver
            .store()
            .get_artifact(&id.group, &id.artifact, &id.version, false)?
            .ok_or_else(|| StoreError::not_found(id.to_string()))?;
        Ok(self.archives.extract_entry(&artifact, path)?)
    }

    fn collect(&self, root: &ResolvedArtifact, path: &str, mode: MatchMode) -> Result<Vec<String>, WalkError> {
        if self.blacklist.contains(path) {
            return Ok(Vec::new());
        }

        let mut hits = Vec::new();
        if self.archives.has_entry(root, path)? {
            hits.push(root.id.hit(path));
            if mode == MatchMode::FirstMatch {
                return Ok(hits);
            }
        }

        let branch = Branch {
            exclusions: ExclusionSet::new(),
            provided: self.provided.iter().map(|key| key.key().clone()).collect(),
        };
        hits.extend(self.walk(root, path, mode, branch, &mut Vec::new())?);
        Ok(hits)
    }

    fn walk(
        &self,
        artifact: &ResolvedArtifact,
        path: &str,
        mode: MatchMode,
        mut branch: Branch,
        stack: &mut Vec<ArtifactId>,
    ) -> Result<Vec<String>, WalkError> {
        let mut hits = Vec::new();
        let Some(descriptor) = self.descriptor(artifact)? else {
            return Ok(hits);
        };
        trace!(artifact = %artifact.id, path, "Checking dependencies");
        let exclusions = branch.exclusions.extend(&descriptor.exclusions);

        let mut direct: Vec<(&DependencyDeclaration, ResolvedArtifact)> = Vec::new();
        for declaration in &descriptor.dependencies {
            if exclusions.excludes(declaration.group(), declaration.artifact()) {
                trace!(dependency = %declaration, "Excluded");
                continue;
            }
            let key = declaration.provided_key();
            if branch.provided.contains(&key) {
                continue;
            }
            if declaration.scope.is_suppressing() {
                branch.provided.insert(key);
                continue;
            }
            if self.resolver.is_ignored(declaration.group(), declaration.artifact()) {
                trace!(dependency = %declaration, "Supplied externally");
                continue;
            }

            trace!(owner = %artifact.id, dependency = %declaration, "Checking dependency");
            let Some(resolved) = self.resolve(artifact, declaration)? else {
                continue;
            };
            if self.archives.has_entry(&resolved, path)? {
                hits.push(resolved.id.hit(path));
            }
            direct.push((declaration, resolved));
        }

        if mode == MatchMode::FirstMatch && !hits.is_empty() {
            return Ok(hits);
        }

        stack.push(artifact.id.clone());
        for (declaration, resolved) in direct {
            if branch.provided.contains(&declaration.provided_key()) {
                continue;
            }
            if stack.contains(&resolved.id) {
                debug!(artifact = %resolved.id, "Skipping dependency cycle");
                continue;
            }
            let child = Branch {
                exclusions: exclusions.extend(&declaration.exclusions),
                provided: branch.provided.clone(),
            };
            hits.extend(self.walk(&resolved, path, mode, child, stack)?);
        }
        stack.pop();

        Ok(hits)
    }

    fn resolve(
        &self,
        owner: &ResolvedArtifact,
        declaration: &DependencyDeclaration,
    ) -> Result<Option<ResolvedArtifact>, WalkError> {
        match self.resolver.resolve(declaration)? {
            Some(resolved) => Ok(Some(resolved)),
            None if declaration.optional => {
                debug!(dependency = %declaration, "Skipping unresolvable optional dependency");
                Ok(None)
            }
            None => Err(WalkError::UnresolvableDependency {
                dependency: declaration.to_string(),
                owner: owner.id.to_string(),
            }),
        }
    }

    /// Decoded descriptor of an artifact, decoded once per walker
    fn descriptor(&self, artifact: &ResolvedArtifact) -> Result<Option<Arc<Descriptor>>, WalkError> {
        let cell = self
            .descriptors
            .entry(artifact.id.clone())
            .or_default()
            .clone();
        let descriptor = cell.get_or_try_init(|| {
            self.resolver
                .descriptor(artifact)
                .map(|descriptor| descriptor.map(Arc::new))
        })?;
        Ok(descriptor.clone())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use deptrail_store::InMemoryArtifactStore;
    use url::Url;

    use super::*;
    use crate::config::ResolverConfig;
    use crate::error::FetchError;
    use crate::fetch::RemoteFetcher;

    struct Offline;

    impl RemoteFetcher for Offline {
        fn fetch(&self, url: &Url) -> Result<Bytes, FetchError> {
            Err(FetchError::transport(url.as_str(), "offline"))
        }
    }

    fn walker(store: Arc<InMemoryArtifactStore>) -> ClosureWalker {
        let resolver = DependencyResolver::new(store, Arc::new(Offline), ResolverConfig::default());
        ClosureWalker::new(Arc::new(resolver), WalkerConfig::default())
    }

    #[test]
    fn test_blacklisted_path_is_never_found() {
        let store = Arc::new(InMemoryArtifactStore::new());
        let root = store.insert(ArtifactId::new("g", "root", "1"), "jar", Bytes::new(), None);
        let walker = walker(store);

        let hits = walker
            .find_all(&root, "META-INF/services/javax.xml.bind.JAXBContext", MatchMode::AllMatches)
            .unwrap();
        assert!(hits.is_empty());
        assert!(walker.archives().is_empty());
    }

    #[test]
    fn test_malformed_descriptor_aborts() {
        let store = Arc::new(InMemoryArtifactStore::new());
        let root = store.insert(
            ArtifactId::new("g", "root", "1"),
            "jar",
            Bytes::new(),
            Some(
                "<project><artifactId>root</artifactId><dependencies><dependency>\
                 <groupId>g</groupId><artifactId>a</artifactId><optional>maybe</optional>\
                 </dependency></dependencies></project>",
            ),
        );
        let walker = walker(store);

        let err = walker.find_all(&root, "x", MatchMode::AllMatches).unwrap_err();
        assert!(matches!(err, WalkError::MalformedDescriptor { .. }));
    }

    #[test]
    fn test_invalid_hit() {
        let walker = walker(Arc::new(InMemoryArtifactStore::new()));
        assert!(matches!(
            walker.read_resource("g/a"),
            Err(WalkError::InvalidHit(_))
        ));
        assert!(matches!(
            walker.read_resource("g/a/1/x.txt"),
            Err(WalkError::Store(StoreError::NotFound(_)))
        ));
    }

    #[test]
    fn test_provided_from_config() {
        let store = Arc::new(InMemoryArtifactStore::new());
        let resolver = DependencyResolver::new(store, Arc::new(Offline), ResolverConfig::default());
        let config = WalkerConfig::default()
            .with_provided("org.osgi", "org.osgi.core")
            .with_blacklisted("ignored/path");
        let walker = ClosureWalker::new(Arc::new(resolver), config);

        assert!(walker.provided.contains("org.osgi/org.osgi.core"));
        assert!(walker.blacklist.contains("ignored/path"));
    }
}
