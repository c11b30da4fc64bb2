//! Validation of parsed bearer tokens.

use subtle::Choice;

use super::association::AssociationToken;
use super::scopes::{validate_scopes, Scope};
use super::token::{AuthToken, LegacyToken, V1Token};
use crate::crypto::Address;
use crate::{HubError, Result};

/// Hub URL requirements applied to V1 tokens.
#[derive(Clone, Copy, Debug, Default)]
pub struct ValidationOptions<'a> {
    /// Reject V1 tokens that do not name one of `valid_hub_urls`.
    pub require_correct_hub_url: bool,
    /// Hub URLs this server answers to.
    pub valid_hub_urls: &'a [String],
}

/// When a token was issued, as far as revocation is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssueTime {
    /// Legacy tokens are never revoked by timestamp.
    Unbounded,
    /// Seconds since the epoch.
    At(i64),
    /// V1 token without an `iat` claim.
    Missing,
}

/// Validator wrapping a parsed token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Authenticator {
    /// Challenge signature only.
    Legacy(LegacyToken),
    /// Signed claims.
    V1(V1Token),
}

impl From<AuthToken> for Authenticator {
    fn from(token: AuthToken) -> Self {
        match token {
            AuthToken::Legacy(token) => Self::Legacy(token),
            AuthToken::V1(token) => Self::V1(token),
        }
    }
}

impl Authenticator {
    /// Parse an `Authorization` header value.
    pub fn from_header(header: &str) -> Result<Self> {
        AuthToken::from_header(header).map(Self::from)
    }

    /// Check that the token authorizes writes to `address`.
    ///
    /// Returns the address whose key ultimately signed: the token key's own
    /// address, or the association signer's when the token is delegated.
    pub fn is_authentication_valid(
        &self,
        address: &str,
        accepted_challenges: &[String],
        options: &ValidationOptions<'_>,
    ) -> Result<Address> {
        match self {
            Self::Legacy(token) => validate_legacy(token, address, accepted_challenges),
            Self::V1(token) => validate_v1(token, address, accepted_challenges, options),
        }
    }

    /// Declared scopes; empty for legacy tokens.
    pub fn scopes(&self) -> &[Scope] {
        match self {
            Self::Legacy(_) => &[],
            Self::V1(token) => token.scopes(),
        }
    }

    /// Issue time used for revocation checks.
    pub fn issue_time(&self) -> IssueTime {
        match self {
            Self::Legacy(_) => IssueTime::Unbounded,
            Self::V1(token) => token
                .claims()
                .iat
                .map(IssueTime::At)
                .unwrap_or(IssueTime::Missing),
        }
    }
}

fn validate_legacy(token: &LegacyToken, address: &str, accepted: &[String]) -> Result<Address> {
    let signer = token.public_key().address();
    if signer.as_str() != address {
        return Err(address_mismatch(&signer, address));
    }

    // Every accepted challenge is tried so timing does not reveal which matched.
    let matched = accepted
        .iter()
        .fold(Choice::from(0), |acc, challenge| {
            acc | Choice::from(u8::from(token.signs(challenge)))
        });
    if !bool::from(matched) {
        return Err(HubError::validation(
            "legacy token signature does not match any accepted challenge text",
        ));
    }

    Ok(signer)
}

fn validate_v1(
    token: &V1Token,
    address: &str,
    accepted: &[String],
    options: &ValidationOptions<'_>,
) -> Result<Address> {
    if !token.verify_signature() {
        return Err(HubError::validation(
            "failed to verify supplied authentication token",
        ));
    }
    let claims = token.claims();

    if !accepted.iter().any(|c| *c == claims.hub_challenge) {
        return Err(HubError::validation(format!(
            "invalid hubChallenge in supplied token: {:?} is not an accepted challenge",
            claims.hub_challenge
        )));
    }

    if let Some(exp) = claims.exp {
        if exp < chrono::Utc::now().timestamp() {
            return Err(HubError::validation(format!(
                "expired authentication token: expired at {}",
                exp
            )));
        }
    }

    if options.require_correct_hub_url {
        let claimed = claims.hub_url.as_deref().ok_or_else(|| {
            HubError::validation("authentication must provide a claimed hub; token has no hubUrl")
        })?;
        let claimed = normalize_hub_url(claimed);
        if !options
            .valid_hub_urls
            .iter()
            .any(|url| normalize_hub_url(url) == claimed)
        {
            return Err(HubError::validation(format!(
                "auth token's claimed hub url {:?} is not one of this hub's urls",
                claimed
            )));
        }
    }

    let signer = match &claims.association_token {
        Some(raw) => AssociationToken::parse(raw)?.verify(token.public_key())?,
        None => token.public_key().address(),
    };
    if signer.as_str() != address {
        return Err(address_mismatch(&signer, address));
    }

    validate_scopes(token.scopes())?;

    Ok(signer)
}

/// Drop a single trailing slash; `https://host` and `https://host/` are the same hub.
pub fn normalize_hub_url(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}

fn address_mismatch(signer: &Address, requested: &str) -> HubError {
    HubError::validation(format!(
        "signer key address {} does not match requested hub address {}",
        signer, requested
    ))
}
