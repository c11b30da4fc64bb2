//! Request orchestration: authenticate, authorize, then hand off to the driver.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::auth::{authorize, Authenticator, IssueTime, ValidationOptions};
use crate::challenge::ChallengeTextProvider;
use crate::config::HubConfig;
use crate::driver::{
    ContentStream, Driver, LimitedStream, ListFilesResult, WriteDescriptor, DEFAULT_CONTENT_TYPE,
};
use crate::proof::{AcceptAllProofs, ProofChecker, ProofPolicy};
use crate::revocation::RevocationRegistry;
use crate::{HubError, Result};

/// Request headers. Names are matched case-insensitively.
pub type Headers = HashMap<String, String>;

const AUTHORIZATION: &str = "authorization";
const CONTENT_TYPE: &str = "content-type";
const CONTENT_LENGTH: &str = "content-length";

/// Look up a header by case-insensitive name.
pub fn header_value<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Authenticated write gateway in front of a storage driver.
pub struct HubServer {
    config: HubConfig,
    challenges: ChallengeTextProvider,
    accepted_challenges: Vec<String>,
    whitelist: Option<HashSet<String>>,
    valid_hub_urls: Vec<String>,
    driver: Arc<dyn Driver>,
    proof_checker: Arc<dyn ProofChecker>,
    revocations: Arc<RevocationRegistry>,
}

impl HubServer {
    /// Create a hub over `driver` with a private revocation registry and no
    /// proof requirements.
    pub fn new(config: HubConfig, driver: Arc<dyn Driver>) -> Result<Self> {
        config.validate()?;

        let challenges = ChallengeTextProvider::new(config.server_name.clone());
        let accepted_challenges = challenges.accepted();
        let whitelist = config
            .whitelist
            .as_ref()
            .filter(|addresses| !addresses.is_empty())
            .map(|addresses| addresses.iter().cloned().collect());
        let valid_hub_urls = config.valid_hub_urls.clone().unwrap_or_default();

        Ok(Self {
            config,
            challenges,
            accepted_challenges,
            whitelist,
            valid_hub_urls,
            driver,
            proof_checker: Arc::new(AcceptAllProofs),
            revocations: Arc::new(RevocationRegistry::new()),
        })
    }

    /// Use `checker` for proof checks.
    pub fn with_proof_checker(mut self, checker: Arc<dyn ProofChecker>) -> Self {
        self.proof_checker = checker;
        self
    }

    /// Share `registry` instead of the private one.
    pub fn with_revocation_registry(mut self, registry: Arc<RevocationRegistry>) -> Self {
        self.revocations = registry;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Challenge texts for this hub's server name.
    pub fn challenges(&self) -> &ChallengeTextProvider {
        &self.challenges
    }

    /// Revocation floors consulted by [`HubServer::validate`].
    pub fn revocations(&self) -> &Arc<RevocationRegistry> {
        &self.revocations
    }

    /// Prefix under which written objects can be read.
    pub fn read_url_prefix(&self) -> String {
        match &self.config.read_url {
            Some(read_url) => read_url.clone(),
            None => self.driver.read_url_prefix(),
        }
    }

    /// Check that `headers` carry a current credential for writing to `address`.
    #[tracing::instrument(skip(self, headers))]
    pub fn validate(&self, address: &str, headers: &Headers) -> Result<Authenticator> {
        let result = self.validate_credential(address, headers);
        if let Err(err) = &result {
            tracing::warn!(error = %err, "rejected credential");
        }
        result
    }

    fn validate_credential(&self, address: &str, headers: &Headers) -> Result<Authenticator> {
        let header = header_value(headers, AUTHORIZATION)
            .ok_or_else(|| HubError::validation("missing authorization header"))?;

        if let Some(whitelist) = &self.whitelist {
            if !whitelist.contains(address) {
                return Err(HubError::validation(format!(
                    "address {} not authorized for writes",
                    address
                )));
            }
        }

        let authenticator =
            Authenticator::from_header(header).map_err(|e| HubError::Validation(e.to_string()))?;

        let options = ValidationOptions {
            require_correct_hub_url: self.config.require_correct_hub_url,
            valid_hub_urls: &self.valid_hub_urls,
        };
        authenticator.is_authentication_valid(address, &self.accepted_challenges, &options)?;

        self.check_revocation(address, &authenticator)?;
        Ok(authenticator)
    }

    fn check_revocation(&self, address: &str, authenticator: &Authenticator) -> Result<()> {
        let Some(oldest_valid) = self.revocations.floor_for(address) else {
            return Ok(());
        };
        match authenticator.issue_time() {
            IssueTime::Unbounded => Ok(()),
            IssueTime::At(issued_at) if issued_at >= oldest_valid => Ok(()),
            IssueTime::At(issued_at) => Err(HubError::AuthTokenTimestampValidation {
                address: address.to_string(),
                issued_at,
                oldest_valid,
            }),
            IssueTime::Missing => Err(HubError::MissingIssueTime {
                address: address.to_string(),
                oldest_valid,
            }),
        }
    }

    /// Authorize and perform a write, returning the URL the object is readable at.
    #[tracing::instrument(skip(self, headers, content))]
    pub async fn handle_request(
        &self,
        address: &str,
        path: &str,
        headers: &Headers,
        content: ContentStream,
    ) -> Result<String> {
        let authenticator = self.validate(address, headers)?;

        if !authorize(authenticator.scopes(), path) {
            tracing::warn!("path outside token scopes");
            return Err(HubError::validation(format!(
                "token is not authorized to write to {}",
                path
            )));
        }

        let content_type = header_value(headers, CONTENT_TYPE)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let content_length = parse_content_length(headers)?;
        if let Some(limit) = self.config.max_file_upload_size_bytes() {
            match content_length {
                None => return Err(HubError::MissingContentLength { limit }),
                Some(length) if length > limit => {
                    return Err(HubError::PayloadTooLarge { length, limit })
                }
                Some(_) => {}
            }
        }

        // The body may not run past its declared length.
        let (content, counter): (ContentStream, _) = match content_length {
            Some(length) => {
                let (stream, counter) = LimitedStream::new(content, length);
                (Box::new(stream), Some((counter, length)))
            }
            None => (content, None),
        };

        let descriptor = WriteDescriptor {
            storage_top_level: address.to_string(),
            path: path.to_string(),
            content_type,
            content_length,
            content,
        };
        let read_url_prefix = self.read_url_prefix();

        let written = match self.config.proof_policy {
            ProofPolicy::Enforced => {
                self.proof_checker
                    .check_proofs(address, path, &read_url_prefix)
                    .await
                    .map_err(HubError::ProofCheck)?;
                self.driver.perform_write(descriptor).await
            }
            ProofPolicy::Advisory => {
                let (proofs, write) = tokio::join!(
                    self.proof_checker
                        .check_proofs(address, path, &read_url_prefix),
                    self.driver.perform_write(descriptor),
                );
                if let Err(err) = proofs {
                    tracing::warn!(error = %err, "proof check failed; write allowed by advisory policy");
                }
                write
            }
        };

        if let Some((counter, limit)) = &counter {
            let length = counter.bytes_read();
            if length > *limit {
                tracing::warn!(length, limit, "body ran past its declared length");
                return Err(HubError::PayloadTooLarge {
                    length,
                    limit: *limit,
                });
            }
        }
        let driver_url = written.map_err(HubError::Driver)?;

        let url = match &self.config.read_url {
            Some(read_url) => format!("{}{}/{}", read_url, address, path),
            None => driver_url,
        };
        tracing::debug!(%url, "write stored");
        Ok(url)
    }

    /// Move the revocation floor for `address` to `timestamp`.
    ///
    /// The caller must hold a credential that is valid right now.
    #[tracing::instrument(skip(self, headers))]
    pub async fn handle_auth_bump(
        &self,
        address: &str,
        timestamp: i64,
        headers: &Headers,
    ) -> Result<()> {
        self.validate(address, headers)?;
        let floor = self.revocations.bump(address, timestamp);
        tracing::info!(floor, "revocation floor bumped");
        Ok(())
    }

    /// List the caller's stored objects.
    #[tracing::instrument(skip(self, headers))]
    pub async fn handle_list_files(
        &self,
        address: &str,
        page: Option<&str>,
        headers: &Headers,
    ) -> Result<ListFilesResult> {
        self.validate(address, headers)?;
        self.driver
            .list_files(address, page)
            .await
            .map_err(HubError::Driver)
    }
}

fn parse_content_length(headers: &Headers) -> Result<Option<u64>> {
    match header_value(headers, CONTENT_LENGTH) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| HubError::InvalidContentLength(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{LegacyToken, V1Token};
    use crate::crypto::KeyPair;
    use crate::driver::DriverResult;
    use async_trait::async_trait;

    struct NullDriver;

    #[async_trait]
    impl Driver for NullDriver {
        fn read_url_prefix(&self) -> String {
            "https://driver.example.com/".into()
        }

        async fn perform_write(&self, descriptor: WriteDescriptor) -> DriverResult<String> {
            Ok(format!("{}{}", self.read_url_prefix(), descriptor.storage_key()))
        }

        async fn list_files(
            &self,
            _storage_top_level: &str,
            _page: Option<&str>,
        ) -> DriverResult<ListFilesResult> {
            Ok(ListFilesResult::default())
        }
    }

    fn server(config: HubConfig) -> HubServer {
        HubServer::new(config, Arc::new(NullDriver)).unwrap()
    }

    fn auth_headers(header: String) -> Headers {
        HashMap::from([("Authorization".to_string(), header)])
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let headers = HashMap::from([("Content-Type".to_string(), "text/plain".to_string())]);
        assert_eq!(header_value(&headers, "content-type"), Some("text/plain"));
        assert_eq!(header_value(&headers, "CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(header_value(&headers, "content-length"), None);
    }

    #[test]
    fn test_content_length_parsing() {
        let mut headers = Headers::new();
        assert_eq!(parse_content_length(&headers).unwrap(), None);
        headers.insert("content-length".into(), " 42 ".into());
        assert_eq!(parse_content_length(&headers).unwrap(), Some(42));
        headers.insert("content-length".into(), "lots".into());
        assert!(matches!(
            parse_content_length(&headers),
            Err(HubError::InvalidContentLength(_))
        ));
    }

    #[test]
    fn test_missing_authorization_is_a_validation_error() {
        let hub = server(HubConfig::new("test-hub"));
        let err = hub.validate("anyone", &Headers::new()).unwrap_err();
        assert!(matches!(err, HubError::Validation(_)));
    }

    #[test]
    fn test_malformed_authorization_is_a_validation_error() {
        let hub = server(HubConfig::new("test-hub"));
        let err = hub
            .validate("anyone", &auth_headers("basic xyz".into()))
            .unwrap_err();
        assert!(matches!(err, HubError::Validation(_)));
        assert!(err.to_string().contains("malformed authorization header"));
    }

    #[test]
    fn test_whitelist_blocks_other_addresses() {
        let keypair = KeyPair::random();
        let hub = server(HubConfig::new("test-hub").with_whitelist(["someone-else"]));
        let token = LegacyToken::build(&keypair, &hub.challenges().current()).into_token();

        let err = hub
            .validate(keypair.address().as_str(), &auth_headers(token.to_header()))
            .unwrap_err();
        assert!(err.to_string().contains("not authorized for writes"));
    }

    #[test]
    fn test_empty_whitelist_is_unrestricted() {
        let keypair = KeyPair::random();
        let hub = server(HubConfig::new("test-hub").with_whitelist(Vec::<String>::new()));
        let token = LegacyToken::build(&keypair, &hub.challenges().current()).into_token();

        hub.validate(keypair.address().as_str(), &auth_headers(token.to_header()))
            .unwrap();
    }

    #[test]
    fn test_missing_issue_time_fails_only_with_a_floor() {
        let keypair = KeyPair::random();
        let address = keypair.address();
        let hub = server(HubConfig::new("test-hub"));
        let token = V1Token::builder(&keypair, hub.challenges().current())
            .without_issued_at()
            .build()
            .unwrap();
        let headers = auth_headers(token.to_header());

        hub.validate(address.as_str(), &headers).unwrap();

        hub.revocations().bump(address.as_str(), 1);
        let err = hub.validate(address.as_str(), &headers).unwrap_err();
        assert!(matches!(err, HubError::MissingIssueTime { .. }));
    }

    #[test]
    fn test_legacy_tokens_ignore_the_floor() {
        let keypair = KeyPair::random();
        let address = keypair.address();
        let hub = server(HubConfig::new("test-hub"));
        let token = LegacyToken::build(&keypair, &hub.challenges().current()).into_token();

        hub.revocations().bump(address.as_str(), i64::MAX);
        hub.validate(address.as_str(), &auth_headers(token.to_header()))
            .unwrap();
    }

    #[test]
    fn test_read_url_prefix_prefers_override() {
        assert_eq!(
            server(HubConfig::new("test-hub")).read_url_prefix(),
            "https://driver.example.com/"
        );
        assert_eq!(
            server(HubConfig::new("test-hub").with_read_url("https://cdn.example.com/"))
                .read_url_prefix(),
            "https://cdn.example.com/"
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = HubConfig::new("test-hub");
        config.require_correct_hub_url = true;
        assert!(HubServer::new(config, Arc::new(NullDriver)).is_err());
    }
}
