//! Subcommand execution over a closure walker

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use deptrail_core::{ArtifactCoordinate, ArtifactStore, DependencyDeclaration, ResolvedArtifact};
use deptrail_resolver::{
    ClosureWalker, DependencyResolver, DeptrailConfig, HttpFetcher, MatchMode, RemoteFetcher,
};
use deptrail_store::LocalRepository;
use tracing::{debug, info};

use crate::config::{Command, Settings};

/// Open the local repository and wire up the HTTP fetcher
pub fn open_walker(settings: &Settings) -> anyhow::Result<ClosureWalker> {
    let store = LocalRepository::open(settings.repository.clone()).with_context(|| {
        format!("Cannot open repository {}", settings.repository.display())
    })?;
    let fetcher = HttpFetcher::new(&settings.deptrail.resolver)?;
    debug!(
        repository = %settings.repository.display(),
        endpoints = settings.deptrail.resolver.endpoints.len(),
        "Opened repository"
    );
    Ok(build_walker(
        Arc::new(store),
        Arc::new(fetcher),
        settings.deptrail.clone(),
    ))
}

pub fn build_walker(
    store: Arc<dyn ArtifactStore>,
    fetcher: Arc<dyn RemoteFetcher>,
    config: DeptrailConfig,
) -> ClosureWalker {
    let resolver = DependencyResolver::new(store, fetcher, config.resolver);
    ClosureWalker::new(Arc::new(resolver), config.walker)
}

/// Run one subcommand, writing its results to `out`
pub fn run(command: &Command, walker: &ClosureWalker, out: &mut dyn Write) -> anyhow::Result<()> {
    match command {
        Command::Resolve { coordinate } => {
            let artifact = resolve_root(walker.resolver(), coordinate)?;
            writeln!(out, "{}", artifact)?;
        }

        Command::Fetch { coordinate } => {
            let artifact = resolve_root(walker.resolver(), coordinate)?;
            writeln!(out, "{}", artifact)?;
            let outcomes = walker.resolver().resolve_descriptor(&artifact)?;
            let missing = outcomes.iter().filter(|o| o.resolved.is_none()).count();
            for outcome in &outcomes {
                match &outcome.resolved {
                    Some(resolved) => writeln!(out, "  {} -> {}", outcome.declaration, resolved)?,
                    None => writeln!(out, "  {} -> missing", outcome.declaration)?,
                }
            }
            info!(artifact = %artifact.id, dependencies = outcomes.len(), missing, "Fetched");
        }

        Command::Find {
            coordinate,
            path,
            all,
        } => {
            let root = resolve_root(walker.resolver(), coordinate)?;
            let mode = if *all {
                MatchMode::AllMatches
            } else {
                MatchMode::FirstMatch
            };
            let hits = walker.find_all(&root, path, mode)?;
            for hit in hits.iter() {
                writeln!(out, "{}", hit)?;
            }
            info!(root = %root.id, path = %path, hits = hits.len(), "Search complete");
        }

        Command::Cat { coordinate, path } => {
            let root = resolve_root(walker.resolver(), coordinate)?;
            let Some(hit) = walker.find_first(&root, path)? else {
                bail!("{} not found in the closure of {}", path, root.id);
            };
            debug!(hit = %hit, "Reading resource");
            out.write_all(&walker.read_resource(&hit)?)?;
        }
    }

    out.flush()?;
    Ok(())
}

fn resolve_root(resolver: &DependencyResolver, text: &str) -> anyhow::Result<ResolvedArtifact> {
    let coordinate = ArtifactCoordinate::parse(text)
        .ok_or_else(|| anyhow!("Invalid coordinate `{}`, expected group:artifact[:version]", text))?;
    let declaration = DependencyDeclaration::new(coordinate);
    resolver
        .resolve(&declaration)?
        .ok_or_else(|| anyhow!("{} not found locally or at any endpoint", text))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::Bytes;
    use deptrail_core::ArtifactId;
    use deptrail_resolver::FetchError;
    use deptrail_store::InMemoryArtifactStore;
    use url::Url;
    use zip::write::SimpleFileOptions;

    use super::*;

    struct Offline;

    impl RemoteFetcher for Offline {
        fn fetch(&self, url: &Url) -> Result<Bytes, FetchError> {
            Err(FetchError::transport(url.as_str(), "offline"))
        }
    }

    fn archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    /// `app` depends on `lib` and on a `ghost` that does not exist
    fn fixture() -> ClosureWalker {
        let store = Arc::new(InMemoryArtifactStore::new());
        store.insert(
            ArtifactId::new("com.acme", "app", "1.0"),
            "jar",
            archive(&[("app.properties", "name=app")]),
            Some(
                "<project><groupId>com.acme</groupId><artifactId>app</artifactId>\
                 <version>1.0</version><dependencies>\
                 <dependency><groupId>com.acme</groupId><artifactId>lib</artifactId>\
                 <version>2.0</version></dependency>\
                 <dependency><groupId>com.acme</groupId><artifactId>ghost</artifactId>\
                 <version>1.0</version><optional>true</optional></dependency>\
                 </dependencies></project>",
            ),
        );
        store.insert(
            ArtifactId::new("com.acme", "lib", "2.0"),
            "jar",
            archive(&[("lib.properties", "name=lib"), ("shared.txt", "from lib")]),
            None,
        );
        build_walker(store, Arc::new(Offline), DeptrailConfig::default())
    }

    fn output(command: Command, walker: &ClosureWalker) -> anyhow::Result<String> {
        let mut out = Vec::new();
        run(&command, walker, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_resolve_picks_latest_version() {
        let walker = fixture();
        let printed = output(
            Command::Resolve {
                coordinate: "com.acme:lib".to_string(),
            },
            &walker,
        )
        .unwrap();
        assert_eq!(printed.trim(), "com.acme:lib:2.0");
    }

    #[test]
    fn test_resolve_rejects_malformed_coordinate() {
        let walker = fixture();
        let err = output(
            Command::Resolve {
                coordinate: "just-a-name".to_string(),
            },
            &walker,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid coordinate"));
    }

    #[test]
    fn test_fetch_reports_missing_dependencies() {
        let walker = fixture();
        let printed = output(
            Command::Fetch {
                coordinate: "com.acme:app:1.0".to_string(),
            },
            &walker,
        )
        .unwrap();

        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with("-> com.acme:lib:2.0"));
        assert!(lines[2].ends_with("-> missing"));
    }

    #[test]
    fn test_find_lists_hits() {
        let walker = fixture();
        let printed = output(
            Command::Find {
                coordinate: "com.acme:app:1.0".to_string(),
                path: "lib.properties".to_string(),
                all: true,
            },
            &walker,
        )
        .unwrap();
        assert_eq!(printed.trim(), "com.acme/lib/2.0/lib.properties");
    }

    #[test]
    fn test_cat_prints_resource() {
        let walker = fixture();
        let printed = output(
            Command::Cat {
                coordinate: "com.acme:app:1.0".to_string(),
                path: "shared.txt".to_string(),
            },
            &walker,
        )
        .unwrap();
        assert_eq!(printed, "from lib");
    }

    #[test]
    fn test_cat_missing_resource() {
        let walker = fixture();
        let err = output(
            Command::Cat {
                coordinate: "com.acme:app:1.0".to_string(),
                path: "nowhere.txt".to_string(),
            },
            &walker,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not found in the closure"));
    }
}
