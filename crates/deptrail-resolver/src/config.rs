//! Resolver and walker configuration
//!
//! Both sections can be loaded from a TOML file:
//!
//! ```toml
//! [resolver]
//! endpoints = ["https://repo1.maven.org/maven2/"]
//! proxy = "http://proxy.internal:3128"
//! update_snapshots = true
//! ignored = ["javax.servlet", "org.slf4j:slf4j-api"]
//! fetch_timeout_secs = 30
//!
//! [walker]
//! provided = ["org.osgi:org.osgi.core"]
//! ```

use std::path::Path;
use std::time::Duration;

use deptrail_core::DEFAULT_PACKAGING;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Paths read while decoding descriptors; looking them up through a walk
/// would recurse into descriptor decoding again.
pub const DEFAULT_BLACKLIST: &[&str] = &[
    "META-INF/services/javax.xml.bind.JAXBContext",
    "META-INF/services/javax.xml.parsers.SAXParserFactory",
];

/// Complete configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeptrailConfig {
    pub resolver: ResolverConfig,
    pub walker: WalkerConfig,
}

impl DeptrailConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Configuration of the dependency resolver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Remote endpoints, tried in order
    pub endpoints: Vec<Url>,
    /// Proxy used for every remote fetch
    pub proxy: Option<Url>,
    /// Re-fetch snapshot artifacts once per resolver lifetime
    pub update_snapshots: bool,
    /// Coordinates supplied externally: `group` or `group:artifact`
    pub ignored: Vec<String>,
    /// Packaging requested from endpoints
    pub packaging: String,
    /// Per-endpoint timeout in seconds
    pub fetch_timeout_secs: Option<u64>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            proxy: None,
            update_snapshots: true,
            ignored: Vec::new(),
            packaging: DEFAULT_PACKAGING.to_string(),
            fetch_timeout_secs: None,
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a remote endpoint
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    pub fn with_proxy(mut self, proxy: Url) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_update_snapshots(mut self, enabled: bool) -> Self {
        self.update_snapshots = enabled;
        self
    }

    /// Ignore a `group` or `group:artifact`
    pub fn with_ignored(mut self, coordinate: impl Into<String>) -> Self {
        self.ignored.push(coordinate.into());
        self
    }

    pub fn with_packaging(mut self, packaging: impl Into<String>) -> Self {
        self.packaging = packaging.into();
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }
}

/// Configuration of the closure walker
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// Resource paths that always yield no hits
    pub blacklist: Vec<String>,
    /// Coordinates (`group:artifact`) supplied by the embedding environment
    pub provided: Vec<String>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            blacklist: DEFAULT_BLACKLIST.iter().map(|p| p.to_string()).collect(),
            provided: Vec::new(),
        }
    }
}

impl WalkerConfig {
    pub fn with_provided(mut self, group: &str, artifact: &str) -> Self {
        self.provided.push(format!("{}:{}", group, artifact));
        self
    }

    pub fn with_blacklisted(mut self, path: impl Into<String>) -> Self {
        self.blacklist.push(path.into());
        self
    }
}
