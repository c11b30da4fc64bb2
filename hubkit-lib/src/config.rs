//! Hub configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::proof::ProofPolicy;
use crate::{HubError, Result};

/// Settings recognized when constructing a [`crate::HubServer`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HubConfig {
    /// Name bound into every challenge text.
    pub server_name: String,

    /// Addresses allowed to write; `None` or empty means anyone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<Vec<String>>,

    /// Require V1 tokens to claim one of `valid_hub_urls`.
    pub require_correct_hub_url: bool,

    /// Hub URLs this server answers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_hub_urls: Option<Vec<String>>,

    /// Prefix returned to clients instead of the driver's own read URL.
    #[serde(rename = "readURL", skip_serializing_if = "Option::is_none")]
    pub read_url: Option<String>,

    /// Largest accepted declared upload, in megabytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_file_upload_size_mb: Option<u64>,

    /// Whether proof failures block writes.
    pub proof_policy: ProofPolicy,
}

impl HubConfig {
    /// Create a configuration for `server_name` with everything else defaulted.
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            ..Default::default()
        }
    }

    /// Parse a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| HubError::Config(e.to_string()))
    }

    /// Read and parse a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| HubError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Restrict writes to `addresses`.
    pub fn with_whitelist<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist = Some(addresses.into_iter().map(Into::into).collect());
        self
    }

    /// Require V1 tokens to claim one of `urls`.
    pub fn with_required_hub_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require_correct_hub_url = true;
        self.valid_hub_urls = Some(urls.into_iter().map(Into::into).collect());
        self
    }

    /// Answer writes with `read_url + address + "/" + path`.
    pub fn with_read_url(mut self, read_url: impl Into<String>) -> Self {
        self.read_url = Some(read_url.into());
        self
    }

    /// Cap declared upload sizes.
    pub fn with_max_file_upload_size_mb(mut self, megabytes: u64) -> Self {
        self.max_file_upload_size_mb = Some(megabytes);
        self
    }

    /// Set the proof policy.
    pub fn with_proof_policy(mut self, policy: ProofPolicy) -> Self {
        self.proof_policy = policy;
        self
    }

    /// Upload cap in bytes.
    pub fn max_file_upload_size_bytes(&self) -> Option<u64> {
        self.max_file_upload_size_mb
            .map(|mb| mb.saturating_mul(1024 * 1024))
    }

    /// Check the settings are consistent.
    pub fn validate(&self) -> Result<()> {
        if self.server_name.trim().is_empty() {
            return Err(HubError::Config("serverName is required".into()));
        }
        let has_hub_urls = self
            .valid_hub_urls
            .as_ref()
            .is_some_and(|urls| !urls.is_empty());
        if self.require_correct_hub_url && !has_hub_urls {
            return Err(HubError::Config(
                "requireCorrectHubUrl is set but validHubUrls is empty".into(),
            ));
        }
        Ok(())
    }
}
