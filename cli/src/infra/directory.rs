//! HTTP implementation of the `InstanceDirectory` port.

use std::time::Duration;

use anyhow::Result;

use crate::application::ports::InstanceDirectory;
use crate::domain::{DirectoryError, DirectoryResponse};

/// Instance directory reached over HTTPS.
pub struct HttpDirectory {
    inner: reqwest::Client,
    base_url: String,
}

impl HttpDirectory {
    /// Create a client for the directory at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ssm-ssh/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DirectoryError::DirectoryUnavailable(e.to_string()))?;
        Ok(Self {
            inner,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn instances_url(&self) -> String {
        format!("{}/instances", self.base_url)
    }
}

fn unavailable(e: &reqwest::Error) -> anyhow::Error {
    DirectoryError::DirectoryUnavailable(e.to_string()).into()
}

impl InstanceDirectory for HttpDirectory {
    async fn lookup(&self, instance_id: &str) -> Result<DirectoryResponse> {
        let url = self.instances_url();
        tracing::debug!(url = %url, instance_id, "directory lookup");

        let response = self
            .inner
            .get(&url)
            .query(&[("instanceName", instance_id)])
            .send()
            .await
            .map_err(|e| unavailable(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                DirectoryError::DirectoryUnavailable(format!("HTTP {status} from {url}")).into(),
            );
        }

        response.json().await.map_err(|e| unavailable(&e))
    }
}
