use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use deptrail_logging::LogConfig;
use deptrail_resolver::DeptrailConfig;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_REPOSITORY: &str = "./repository";

#[derive(Parser, Debug)]
#[command(
    name = "deptrail",
    about = "Resolve artifacts and find resources across their dependency closures"
)]
pub struct Cli {
    /// Local repository directory
    #[arg(long, global = true)]
    pub repo: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Remote endpoint, tried in the order given (replaces configured endpoints)
    #[arg(long = "endpoint", global = true)]
    pub endpoints: Vec<Url>,

    /// Proxy for remote fetches
    #[arg(long, global = true)]
    pub proxy: Option<Url>,

    /// Externally supplied `group` or `group:artifact`
    #[arg(long = "ignore", global = true)]
    pub ignored: Vec<String>,

    /// Never re-fetch snapshot artifacts that exist locally
    #[arg(long, global = true)]
    pub no_snapshot_updates: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resolve a coordinate, fetching it if it is missing locally
    Resolve {
        /// `group:artifact[:version]`
        coordinate: String,
    },
    /// Resolve a coordinate and every direct dependency it declares
    Fetch {
        /// `group:artifact[:version]`
        coordinate: String,
    },
    /// List artifacts in a dependency closure containing a resource
    Find {
        /// Root `group:artifact[:version]`
        coordinate: String,
        /// Resource path inside the archives
        path: String,
        /// Report every match instead of the shallowest ones
        #[arg(long)]
        all: bool,
    },
    /// Print the first matching resource from a dependency closure
    Cat {
        /// Root `group:artifact[:version]`
        coordinate: String,
        /// Resource path inside the archives
        path: String,
    },
}

/// Sections of the configuration file only the binary reads
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    repository: Option<PathBuf>,
    logging: LogConfig,
}

/// Effective settings after applying flags over the configuration file
#[derive(Debug, Clone)]
pub struct Settings {
    pub repository: PathBuf,
    pub deptrail: DeptrailConfig,
    pub logging: LogConfig,
}

impl Cli {
    /// Load the configuration file, if any, and apply flag overrides
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings = match &self.config {
            Some(path) => load_file(path)?,
            None => Settings {
                repository: PathBuf::from(DEFAULT_REPOSITORY),
                deptrail: DeptrailConfig::default(),
                logging: LogConfig::default(),
            },
        };
        Ok(self.apply(settings))
    }

    fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(repo) = &self.repo {
            settings.repository = repo.clone();
        }

        let resolver = &mut settings.deptrail.resolver;
        if !self.endpoints.is_empty() {
            resolver.endpoints = self.endpoints.clone();
        }
        if let Some(proxy) = &self.proxy {
            resolver.proxy = Some(proxy.clone());
        }
        resolver.ignored.extend(self.ignored.iter().cloned());
        if self.no_snapshot_updates {
            resolver.update_snapshots = false;
        }

        if let Some(level) = &self.log_level {
            settings.logging.default_level = level.clone();
        }
        settings
    }
}

fn load_file(path: &Path) -> anyhow::Result<Settings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read configuration {}", path.display()))?;
    let deptrail = DeptrailConfig::from_toml(&content)
        .with_context(|| format!("Invalid configuration {}", path.display()))?;
    let file: FileSettings = toml::from_str(&content)
        .with_context(|| format!("Invalid configuration {}", path.display()))?;

    Ok(Settings {
        repository: file
            .repository
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPOSITORY)),
        deptrail,
        logging: file.logging,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_find() {
        let cli = Cli::try_parse_from([
            "deptrail",
            "find",
            "com.acme:widget:1.0",
            "com/acme/Widget.class",
            "--all",
        ])
        .unwrap();

        assert_eq!(
            cli.command,
            Command::Find {
                coordinate: "com.acme:widget:1.0".to_string(),
                path: "com/acme/Widget.class".to_string(),
                all: true,
            }
        );
    }

    #[test]
    fn test_repeatable_global_flags() {
        let cli = Cli::try_parse_from([
            "deptrail",
            "resolve",
            "com.acme:widget",
            "--endpoint",
            "https://first.example/",
            "--endpoint",
            "https://second.example/",
            "--ignore",
            "javax.servlet",
            "--no-snapshot-updates",
        ])
        .unwrap();

        assert_eq!(cli.endpoints.len(), 2);
        assert_eq!(cli.endpoints[1].as_str(), "https://second.example/");
        assert_eq!(cli.ignored, vec!["javax.servlet".to_string()]);
        assert!(cli.no_snapshot_updates);
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let result = Cli::try_parse_from(["deptrail", "resolve", "g:a", "--endpoint", "not a url"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_defaults_without_config_file() {
        let cli = Cli::try_parse_from(["deptrail", "fetch", "g:a:1"]).unwrap();
        let settings = cli.settings().unwrap();

        assert_eq!(settings.repository, PathBuf::from(DEFAULT_REPOSITORY));
        assert!(settings.deptrail.resolver.endpoints.is_empty());
        assert!(settings.deptrail.resolver.update_snapshots);
        assert_eq!(settings.logging.default_level, "info");
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            repository = "/srv/repository"

            [resolver]
            endpoints = ["https://configured.example/"]
            ignored = ["org.slf4j"]

            [walker]
            provided = ["org.osgi:org.osgi.core"]

            [logging]
            default_level = "warn"
            "#
        )
        .unwrap();

        let path = file.path().to_str().unwrap();
        let cli = Cli::try_parse_from([
            "deptrail",
            "--config",
            path,
            "--endpoint",
            "https://override.example/",
            "--ignore",
            "javax.servlet:servlet-api",
            "--log-level",
            "debug",
            "cat",
            "g:a:1",
            "x.txt",
        ])
        .unwrap();
        let settings = cli.settings().unwrap();

        assert_eq!(settings.repository, PathBuf::from("/srv/repository"));
        let resolver = &settings.deptrail.resolver;
        assert_eq!(resolver.endpoints.len(), 1);
        assert_eq!(resolver.endpoints[0].as_str(), "https://override.example/");
        assert_eq!(
            resolver.ignored,
            vec!["org.slf4j".to_string(), "javax.servlet:servlet-api".to_string()]
        );
        assert_eq!(settings.deptrail.walker.provided.len(), 1);
        assert_eq!(settings.logging.default_level, "debug");
    }

    #[test]
    fn test_missing_config_file() {
        let cli = Cli::try_parse_from(["deptrail", "--config", "/nonexistent/deptrail.toml", "resolve", "g:a"])
            .unwrap();
        assert!(cli.settings().is_err());
    }
}
