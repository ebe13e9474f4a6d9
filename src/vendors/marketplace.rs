use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use log::{debug, warn};
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::HttpConfig;
use crate::error::{ClientBuildError, FetchError};
use crate::schema::{ReleaseList, Vendor};

use super::ConnectionInfo;
use super::fetcher::ReleaseFetcher;

/// Name of the root document of a vendor repository.
pub const INDEX_FILE: &str = "index.json";

/// Nested indexes deeper than this are ignored.
const MAX_INDEX_DEPTH: usize = 8;

/// Repository index document.
///
/// Both lists hold paths relative to the index file itself:
/// - `indexes`: nested index documents
/// - `releases`: release list documents (`{"releases": [...]}`)
///
#[derive(Debug, Default, Deserialize)]
struct RepositoryIndex {
    #[serde(default)]
    indexes: Vec<String>,

    #[serde(default)]
    releases: Vec<String>,
}

/// HTTP client for a vendor's marketplace repository.
///
/// IMPORTANT:
/// - Connections are never reused between requests
/// - Cookies are not stored
/// - The access key (if any) is sent as a bearer token on every request
///   and is never logged
///
pub struct MarketplaceClient {
    vendor: Vendor,
    base_url: Url,
    http: reqwest::Client,
}

impl MarketplaceClient {
    /// Builds a client from the vendor's connection info.
    ///
    /// Fails when the URL does not parse as http(s), when the key cannot
    /// be carried in a header, or when the TLS backend cannot start.
    pub fn build(
        vendor: Vendor,
        info: &ConnectionInfo,
        http: &HttpConfig,
    ) -> Result<Self, ClientBuildError> {
        let base_url = parse_base_url(&info.url)?;

        let mut headers = HeaderMap::new();
        if let Some(key) = info.key.as_deref() {
            let mut value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| ClientBuildError::InvalidKey)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let redirect = match http.max_redirects {
            0 => Policy::none(),
            n => Policy::limited(n),
        };

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(http.timeout_secs))
            .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
            .pool_max_idle_per_host(0)
            .redirect(redirect)
            .build()?;

        Ok(Self {
            vendor,
            base_url,
            http: client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Walks the repository index tree and returns every release found.
    ///
    /// Indexes are visited breadth-first, each at most once. Release files
    /// listed by several indexes are read once.
    pub async fn read_repository_data(&self) -> Result<ReleaseList, FetchError> {
        let root = join(&self.base_url, INDEX_FILE)?;

        let mut queue = VecDeque::from([(root, 0usize)]);
        let mut visited_indexes = HashSet::new();
        let mut release_files = Vec::new();

        while let Some((index_url, depth)) = queue.pop_front() {
            if !visited_indexes.insert(index_url.clone()) {
                continue;
            }

            let index: RepositoryIndex = self.get_json(&index_url).await?;
            debug!(
                "{} index {} lists {} releases files, {} nested indexes",
                self.vendor,
                index_url,
                index.releases.len(),
                index.indexes.len()
            );

            for path in &index.releases {
                release_files.push(join(&index_url, path)?);
            }

            for path in &index.indexes {
                let nested = join(&index_url, path)?;
                if depth + 1 > MAX_INDEX_DEPTH {
                    warn!("{} index {} is nested too deep, ignored", self.vendor, nested);
                    continue;
                }
                queue.push_back((nested, depth + 1));
            }
        }

        let mut seen_files = HashSet::new();
        let mut releases = Vec::new();
        for file in release_files {
            if !seen_files.insert(file.clone()) {
                continue;
            }
            let list: ReleaseList = self.get_json(&file).await?;
            releases.extend(list.releases);
        }

        Ok(ReleaseList::new(releases))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        let transport = |source: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let resp = self.http.get(url.clone()).send().await.map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(transport)?;
        serde_json::from_slice(&body).map_err(|source| FetchError::Parse {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait::async_trait]
impl ReleaseFetcher for MarketplaceClient {
    fn vendor(&self) -> Vendor {
        self.vendor
    }

    async fn fetch(&self) -> Result<ReleaseList, FetchError> {
        self.read_repository_data().await
    }
}

/// Parses a repository root URL. A trailing slash is added so relative
/// joins stay below the root instead of replacing its last segment.
fn parse_base_url(raw: &str) -> Result<Url, ClientBuildError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }

    let url = Url::parse(&normalized).map_err(|e| ClientBuildError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientBuildError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

fn join(base: &Url, path: &str) -> Result<Url, FetchError> {
    base.join(path).map_err(|e| FetchError::InvalidUrl {
        url: path.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn install_crypto() {
        let _ = rustls::crypto::ring::default_provider().install_default();
    }

    fn info(url: &str, key: Option<&str>) -> ConnectionInfo {
        ConnectionInfo {
            url: url.to_string(),
            key: key.map(str::to_string),
        }
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        install_crypto();

        let client = MarketplaceClient::build(
            Vendor::Adoptium,
            &info("https://example.com/repo", None),
            &HttpConfig::default(),
        )
        .unwrap();

        assert_eq!(client.base_url().as_str(), "https://example.com/repo/");
        assert_eq!(
            join(client.base_url(), INDEX_FILE).unwrap().as_str(),
            "https://example.com/repo/index.json"
        );
    }

    #[test]
    fn nested_paths_resolve_against_their_index() {
        let index = Url::parse("https://example.com/repo/jdk17/index.json").unwrap();

        assert_eq!(
            join(&index, "releases.json").unwrap().as_str(),
            "https://example.com/repo/jdk17/releases.json"
        );
    }

    #[test]
    fn invalid_url_fails_construction() {
        install_crypto();

        let result = MarketplaceClient::build(
            Vendor::Azul,
            &info("not a url", None),
            &HttpConfig::default(),
        );
        assert!(matches!(result, Err(ClientBuildError::InvalidUrl { .. })));

        let result = MarketplaceClient::build(
            Vendor::Azul,
            &info("ftp://example.com/repo", None),
            &HttpConfig::default(),
        );
        assert!(matches!(result, Err(ClientBuildError::InvalidUrl { .. })));
    }

    #[test]
    fn key_with_newline_fails_construction() {
        install_crypto();

        let result = MarketplaceClient::build(
            Vendor::Ibm,
            &info("https://example.com", Some("abc\ndef")),
            &HttpConfig::default(),
        );

        assert!(matches!(result, Err(ClientBuildError::InvalidKey)));
    }
}
