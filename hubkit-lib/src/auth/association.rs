//! Association tokens: one-hop delegation from an identity key to a child key.
//!
//! The signer authorizes `childToAssociate` to write into the signer's
//! namespace. An association token never embeds another one.

use serde::{Deserialize, Serialize};

use super::compact::CompactToken;
use crate::crypto::{Address, KeyPair, PublicKey};
use crate::{HubError, Result};

/// Lifetime of association tokens built with [`AssociationToken::build`].
pub const DEFAULT_ASSOCIATION_LIFETIME_SECS: i64 = 30 * 24 * 60 * 60;

/// Claim name whose presence marks a nested delegation.
const NESTED_CLAIM: &str = "associationToken";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssociationClaims {
    child_to_associate: String,
    iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
    salt: String,
}

/// Delegation credential chained into a V1 token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssociationToken {
    claims: AssociationClaims,
    encoded: CompactToken,
}

impl AssociationToken {
    /// Authorize `child` to act for `signer`'s address for the default lifetime.
    pub fn build(signer: &KeyPair, child: &PublicKey) -> Result<Self> {
        let expires_at = chrono::Utc::now().timestamp() + DEFAULT_ASSOCIATION_LIFETIME_SECS;
        Self::build_with_expiry(signer, child, expires_at)
    }

    /// Authorize `child` to act for `signer`'s address until `expires_at`.
    pub fn build_with_expiry(signer: &KeyPair, child: &PublicKey, expires_at: i64) -> Result<Self> {
        let claims = AssociationClaims {
            child_to_associate: child.to_hex(),
            iss: signer.public_key().to_hex(),
            exp: Some(expires_at),
            iat: Some(chrono::Utc::now().timestamp()),
            salt: super::random_salt(),
        };
        let encoded = CompactToken::sign(signer, &claims)?;
        Ok(Self { claims, encoded })
    }

    /// Decode an association token as carried in V1 claims.
    ///
    /// Decoding failures are validation failures of the enclosing token.
    pub fn parse(raw: &str) -> Result<Self> {
        let encoded = CompactToken::decode(raw).map_err(|e| {
            HubError::validation(format!("failed to decode association token: {}", e))
        })?;
        let value: serde_json::Value = serde_json::from_slice(encoded.claims())
            .map_err(|e| HubError::validation(format!("invalid association claims: {}", e)))?;
        if value.get(NESTED_CLAIM).is_some() {
            return Err(HubError::validation(
                "association tokens cannot embed another association token",
            ));
        }
        let claims: AssociationClaims = serde_json::from_value(value)
            .map_err(|e| HubError::validation(format!("invalid association claims: {}", e)))?;
        Ok(Self { claims, encoded })
    }

    /// Encoded form, as embedded in V1 claims.
    pub fn serialize(&self) -> &str {
        self.encoded.as_str()
    }

    /// Child key named by the token, as hex.
    pub fn child_public_key(&self) -> &str {
        &self.claims.child_to_associate
    }

    /// Signer key named by the token, as hex.
    pub fn signer_public_key(&self) -> &str {
        &self.claims.iss
    }

    /// Expiry claim, if any.
    pub fn expires_at(&self) -> Option<i64> {
        self.claims.exp
    }

    /// Verify the delegation to `expected_child` and return the signer's address.
    pub fn verify(&self, expected_child: &PublicKey) -> Result<Address> {
        let signer: PublicKey = self.claims.iss.parse().map_err(|e| {
            HubError::validation(format!("association token has an invalid issuer: {}", e))
        })?;
        let expires_at = self
            .claims
            .exp
            .ok_or_else(|| HubError::validation("association token must provide an exp claim"))?;

        if !self.encoded.verify(&signer) {
            return Err(HubError::validation(
                "association token signature verification failed",
            ));
        }

        let now = chrono::Utc::now().timestamp();
        if expires_at < now {
            return Err(HubError::validation(format!(
                "expired association token: expired at {}",
                expires_at
            )));
        }

        let child: PublicKey = self.claims.child_to_associate.parse().map_err(|e| {
            HubError::validation(format!("association token has an invalid child key: {}", e))
        })?;
        if child == signer {
            return Err(HubError::validation(
                "association token cannot delegate a key to itself",
            ));
        }
        if child != *expected_child {
            return Err(HubError::validation(format!(
                "association token child key {} does not match bearer key {}",
                self.claims.child_to_associate, expected_child
            )));
        }

        Ok(signer.address())
    }
}
