//! Fetching version listings from the configured index mirrors.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use nixpin_core::candidate::Candidate;
use nixpin_core::reqfile::IndexConfig;
use nixpin_core::version::PyVersion;
use nixpin_util::errors::{NixpinError, NixpinResult};

use crate::simple;

pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/simple";

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for the configured package indexes.
///
/// The extra index, when configured, is consulted before the primary one;
/// the first mirror that yields a listing wins and later mirrors are not
/// merged in.
pub struct IndexClient {
    client: Client,
    index_url: String,
    extra_index_url: Option<String>,
}

impl IndexClient {
    pub fn new(config: &IndexConfig) -> NixpinResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("nixpin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| NixpinError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            index_url: config
                .index_url
                .clone()
                .unwrap_or_else(|| DEFAULT_INDEX_URL.to_string()),
            extra_index_url: config.extra_index_url.clone(),
        })
    }

    /// The listing URLs for a package, in consultation order.
    pub fn listing_urls(&self, name: &str) -> NixpinResult<Vec<Url>> {
        let path = format!("{}/", index_name(name));
        let mut urls = Vec::new();
        for base in self
            .extra_index_url
            .iter()
            .chain(std::iter::once(&self.index_url))
        {
            let base = Url::parse(&format!("{}/", base.trim_end_matches('/'))).map_err(|e| {
                NixpinError::Generic {
                    message: format!("Invalid index URL '{base}': {e}"),
                }
            })?;
            let url = base.join(&path).map_err(|e| NixpinError::Generic {
                message: format!("Invalid index URL '{base}': {e}"),
            })?;
            urls.push(url);
        }
        Ok(urls)
    }

    /// Fetch the available versions of a package.
    ///
    /// Each mirror is retried on server errors and timeouts before moving
    /// on; when every mirror fails the error lists all URLs tried.
    pub async fn versions(&self, name: &str) -> NixpinResult<BTreeMap<PyVersion, Candidate>> {
        let urls = self.listing_urls(name)?;

        for url in &urls {
            match self.fetch_listing(url).await {
                Ok(Some(html)) => {
                    let candidates = simple::parse_listing(url, name, &html);
                    debug!("{name}: {} candidate versions from {url}", candidates.len());
                    return Ok(candidates);
                }
                Ok(None) => {
                    debug!("{name}: not found at {url}");
                }
                Err(message) => {
                    warn!("{name}: {message}");
                }
            }
        }

        Err(NixpinError::SourceUnavailable {
            name: name.to_string(),
            tried: urls
                .iter()
                .map(Url::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        }
        .into())
    }

    /// Fetch one listing page. `Ok(None)` means the package is not in this
    /// index; `Err` carries a description for the mirror-fallback log.
    async fn fetch_listing(&self, url: &Url) -> Result<Option<String>, String> {
        let mut last_err = String::new();

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                tokio::time::sleep(RETRY_DELAY * attempt).await;
            }

            match self.client.get(url.clone()).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Ok(None);
                    }
                    if status.is_server_error() {
                        last_err = format!("HTTP {status} from {url}");
                        continue;
                    }
                    if !status.is_success() {
                        return Err(format!("HTTP {status} fetching {url}"));
                    }
                    return match resp.text().await {
                        Ok(html) => Ok(Some(html)),
                        Err(e) => Err(format!("Failed to read response from {url}: {e}")),
                    };
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    last_err = format!("{e}");
                    continue;
                }
                Err(e) => return Err(format!("Request to {url} failed: {e}")),
            }
        }

        Err(format!(
            "Failed after {MAX_RETRIES} retries for {url}: {last_err}"
        ))
    }
}

/// The name form used in listing URLs: lowercase, with every run of `-`,
/// `_` and `.` collapsed to a single `-` (`zc.buildout` -> `zc-buildout`).
/// This is stricter than the canonical requirement key, which keeps dots.
pub fn index_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_run {
                out.push('-');
                in_run = true;
            }
        } else {
            out.push(c.to_ascii_lowercase());
            in_run = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_name_collapses_separators() {
        assert_eq!(index_name("setuptools_scm"), "setuptools-scm");
        assert_eq!(index_name("zc.buildout"), "zc-buildout");
        assert_eq!(index_name("Django"), "django");
        assert_eq!(index_name("a._-b"), "a-b");
    }

    #[test]
    fn extra_index_is_consulted_first() {
        let client = IndexClient::new(&IndexConfig {
            index_url: None,
            extra_index_url: Some("https://internal.example/simple".to_string()),
        })
        .unwrap();
        let urls = client.listing_urls("zope.interface").unwrap();
        assert_eq!(
            urls[0].as_str(),
            "https://internal.example/simple/zope-interface/"
        );
        assert_eq!(urls[1].as_str(), "https://pypi.org/simple/zope-interface/");
    }

    #[test]
    fn trailing_slash_on_index_is_normalized() {
        let client = IndexClient::new(&IndexConfig {
            index_url: Some("https://mirror.example/simple/".to_string()),
            extra_index_url: None,
        })
        .unwrap();
        let urls = client.listing_urls("pkga").unwrap();
        assert_eq!(urls, vec![Url::parse("https://mirror.example/simple/pkga/").unwrap()]);
    }
}
