//! HTTP resource loader backed by reqwest.

use crate::loader::ResourceLoader;
use crate::models::{Result, SyncpointError};
use futures_util::future::BoxFuture;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Configuration for [`HttpLoader`].
#[derive(Debug, Clone, Deserialize)]
pub struct HttpLoaderConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header sent with each request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "syncpoint".to_string()
}

impl Default for HttpLoaderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Resource loader that issues a GET request per URI.
///
/// No retries and no backoff: a failed fetch is reported once and the caller
/// (the barrier) treats it as a checkpoint that never completes.
pub struct HttpLoader {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpLoader {
    /// Create a loader from configuration.
    pub fn new(config: &HttpLoaderConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(SyncpointError::Network)?;

        Ok(Self { client, timeout })
    }

    /// Create a loader with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(&HttpLoaderConfig::default())
    }

    async fn get(client: reqwest::Client, timeout: Duration, uri: String) -> Result<Vec<u8>> {
        let response = client.get(&uri).send().await.map_err(|e| {
            if e.is_timeout() {
                SyncpointError::Timeout(timeout)
            } else {
                SyncpointError::Network(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncpointError::Http {
                status: status.as_u16(),
                uri,
            });
        }

        let body = response.bytes().await.map_err(SyncpointError::Network)?;
        debug!(uri = %uri, bytes = body.len(), "asset fetched");
        Ok(body.to_vec())
    }
}

impl ResourceLoader for HttpLoader {
    fn fetch(&self, uri: &str) -> BoxFuture<'static, Result<Vec<u8>>> {
        let client = self.client.clone();
        let timeout = self.timeout;
        let uri = uri.to_string();
        Box::pin(Self::get(client, timeout, uri))
    }
}
