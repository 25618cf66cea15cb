//! Remote artifact fetching

use bytes::Bytes;
use deptrail_core::ArtifactId;
use reqwest::blocking::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::config::ResolverConfig;
use crate::error::FetchError;

/// Source of archive bytes for a remote location
///
/// Implementations block the calling thread and must be callable from
/// many threads at once.
pub trait RemoteFetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> Result<Bytes, FetchError>;
}

/// Location of an artifact archive below an endpoint
///
/// `endpoint/group/with/slashes/artifact/version/artifact-version.ext`
pub fn artifact_url(endpoint: &Url, id: &ArtifactId, extension: &str) -> Result<Url, FetchError> {
    let mut base = endpoint.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(&id.relative_path(extension))?)
}

/// Blocking HTTP(S) fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher honouring the configured proxy and timeout
    pub fn new(config: &ResolverConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| FetchError::Client(e.to_string()))?;
            builder = builder.proxy(proxy);
        }
        if let Some(timeout) = config.fetch_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl RemoteFetcher for HttpFetcher {
    #[instrument(skip(self), fields(url = %url))]
    fn fetch(&self, url: &Url) -> Result<Bytes, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| FetchError::transport(url.as_str(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .map_err(|e| FetchError::transport(url.as_str(), e.to_string()))?;
        debug!(size = bytes.len(), "Fetched remote artifact");
        Ok(bytes)
    }
}
