//! Release update checking.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use warden_utils::locks::SyncMutex;

/// Default endpoint for the latest release.
pub const DEFAULT_RELEASE_URL: &str = "https://api.github.com/repos/warden-ac/warden/releases/latest";

const USER_AGENT: &str = concat!("warden/", env!("CARGO_PKG_VERSION"));

/// An error that can occur while looking up the latest release.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// The HTTP request failed.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The release endpoint answered with an unexpected status.
    #[error("Unexpected status code {0}")]
    Status(StatusCode),
    /// The response did not name a release.
    #[error("Response did not contain a release tag")]
    MissingTag,
}

/// Where the latest release version comes from.
pub trait ReleaseSource: Send + Sync {
    /// Fetches the latest released version string.
    fn latest_release(&self) -> BoxFuture<'_, Result<String, UpdateError>>;
}

#[derive(Deserialize)]
struct Release {
    tag_name: Option<String>,
}

/// Reads the latest release from a GitHub-style releases endpoint.
pub struct GithubReleases {
    client: reqwest::Client,
    url: String,
}

impl GithubReleases {
    /// Creates a source querying `url`.
    pub fn new(url: impl Into<String>) -> Result<Self, UpdateError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl ReleaseSource for GithubReleases {
    fn latest_release(&self) -> BoxFuture<'_, Result<String, UpdateError>> {
        Box::pin(async move {
            let response = self.client.get(&self.url).send().await?;
            match response.status() {
                StatusCode::OK => {
                    let release: Release = response.json().await?;
                    release
                        .tag_name
                        .map(|tag| tag.trim_start_matches('v').to_owned())
                        .ok_or(UpdateError::MissingTag)
                }
                other => Err(UpdateError::Status(other)),
            }
        })
    }
}

/// Compares the running version with the latest release.
pub struct UpdateChecker {
    local_version: String,
    source: Arc<dyn ReleaseSource>,
    cached: SyncMutex<Option<String>>,
}

impl UpdateChecker {
    /// Creates a checker for the running `local_version`.
    pub fn new(local_version: impl Into<String>, source: Arc<dyn ReleaseSource>) -> Self {
        Self {
            local_version: local_version.into(),
            source,
            cached: SyncMutex::new(None),
        }
    }

    /// The running version.
    #[must_use]
    pub fn local_version(&self) -> &str {
        &self.local_version
    }

    /// The latest release. The first successful lookup is cached.
    pub async fn latest_version(&self) -> Result<String, UpdateError> {
        if let Some(cached) = self.cached.lock().clone() {
            return Ok(cached);
        }
        let latest = self.source.latest_release().await?;
        *self.cached.lock() = Some(latest.clone());
        Ok(latest)
    }

    /// Whether `latest` differs from the running version, ignoring case.
    #[must_use]
    pub fn is_outdated(&self, latest: &str) -> bool {
        !self.local_version.eq_ignore_ascii_case(latest)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    struct CountingSource {
        calls: AtomicU32,
    }

    impl ReleaseSource for CountingSource {
        fn latest_release(&self) -> BoxFuture<'_, Result<String, UpdateError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(String::from("1.2.0")) })
        }
    }

    #[tokio::test]
    async fn caches_first_lookup() {
        let source = Arc::new(CountingSource {
            calls: AtomicU32::new(0),
        });
        let checker = UpdateChecker::new("1.1.0", source.clone());
        assert_eq!(checker.latest_version().await.unwrap(), "1.2.0");
        assert_eq!(checker.latest_version().await.unwrap(), "1.2.0");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn version_comparison_ignores_case() {
        let checker = UpdateChecker::new(
            "1.0.0-RC1",
            Arc::new(CountingSource {
                calls: AtomicU32::new(0),
            }),
        );
        assert!(!checker.is_outdated("1.0.0-rc1"));
        assert!(checker.is_outdated("1.0.1"));
    }
}
