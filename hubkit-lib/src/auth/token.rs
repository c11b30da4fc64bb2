//! Bearer tokens carried in the `Authorization` header.
//!
//! Two encodings are accepted:
//!
//! - **V1**: `v1:` followed by a compact signed token whose claims name the
//!   challenge, issuer key, optional hub URL, scopes, association token and
//!   issue/expiry times.
//! - **Legacy**: base64 of `{"publickey": .., "signature": ..}`, where the
//!   signature covers a challenge text alone.
//!
//! Parsing tries V1 first and falls back to legacy.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::association::AssociationToken;
use super::compact::CompactToken;
use super::scopes::Scope;
use crate::crypto::{self, KeyPair, PublicKey};
use crate::{HubError, Result};

/// Prefix marking the V1 encoding.
pub const V1_PREFIX: &str = "v1:";

/// Authorization scheme keyword.
pub const BEARER_SCHEME: &str = "bearer";

/// Parsed bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthToken {
    /// Signature over a challenge text, full access, no issue time.
    Legacy(LegacyToken),
    /// Signed claims with optional scopes, hub URL and delegation.
    V1(V1Token),
}

impl AuthToken {
    /// Parse an `Authorization` header value of the form `bearer <token>`.
    pub fn from_header(header: &str) -> Result<Self> {
        let (scheme, token) = header
            .trim()
            .split_once(' ')
            .ok_or_else(|| HubError::MalformedAuthHeader("expected `bearer <token>`".into()))?;
        if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
            return Err(HubError::MalformedAuthHeader(format!(
                "unsupported scheme {:?}",
                scheme
            )));
        }
        let token = token.trim();
        if token.is_empty() {
            return Err(HubError::MalformedAuthHeader("empty bearer token".into()));
        }
        Self::parse(token)
    }

    /// Parse a serialized token.
    pub fn parse(token: &str) -> Result<Self> {
        let v1_err = match V1Token::decode(token) {
            Ok(v1) => return Ok(Self::V1(v1)),
            Err(e) => e,
        };
        match LegacyToken::decode(token) {
            Ok(legacy) => Ok(Self::Legacy(legacy)),
            Err(legacy_err) => Err(HubError::MalformedAuthToken(format!(
                "not a v1 token ({}) and not a legacy token ({})",
                v1_err, legacy_err
            ))),
        }
    }

    /// Serialized token, byte-identical to what was parsed or built.
    pub fn serialize(&self) -> String {
        match self {
            Self::Legacy(token) => token.encoded.clone(),
            Self::V1(token) => format!("{}{}", V1_PREFIX, token.encoded.as_str()),
        }
    }

    /// `Authorization` header value for this token.
    pub fn to_header(&self) -> String {
        format!("{} {}", BEARER_SCHEME, self.serialize())
    }

    /// Public key that signed the token.
    pub fn public_key(&self) -> &PublicKey {
        match self {
            Self::Legacy(token) => &token.public_key,
            Self::V1(token) => &token.public_key,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LegacyPayload {
    publickey: String,
    signature: String,
}

/// Legacy token: a signature over one challenge text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyToken {
    public_key: PublicKey,
    signature: Vec<u8>,
    encoded: String,
}

impl LegacyToken {
    /// Sign `challenge` with `keypair`.
    pub fn build(keypair: &KeyPair, challenge: &str) -> Self {
        let public_key = keypair.public_key();
        let signature = crypto::sign(keypair, challenge.as_bytes());
        let payload = serde_json::json!({
            "publickey": public_key.to_hex(),
            "signature": hex::encode(signature),
        });
        Self {
            public_key,
            signature: signature.to_vec(),
            encoded: STANDARD.encode(payload.to_string()),
        }
    }

    fn decode(token: &str) -> Result<Self> {
        let json = STANDARD
            .decode(token)
            .map_err(|e| HubError::MalformedAuthToken(format!("not base64: {}", e)))?;
        let payload: LegacyPayload = serde_json::from_slice(&json)
            .map_err(|e| HubError::MalformedAuthToken(format!("invalid payload: {}", e)))?;
        let public_key: PublicKey = payload
            .publickey
            .parse()
            .map_err(|e| HubError::MalformedAuthToken(format!("{}", e)))?;
        let signature = hex::decode(&payload.signature)
            .map_err(|e| HubError::MalformedAuthToken(format!("signature is not hex: {}", e)))?;
        Ok(Self {
            public_key,
            signature,
            encoded: token.to_string(),
        })
    }

    /// Signing key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Whether the signature covers `challenge`.
    pub fn signs(&self, challenge: &str) -> bool {
        crypto::verify(&self.public_key, challenge.as_bytes(), &self.signature)
    }

    /// Wrap as an [`AuthToken`].
    pub fn into_token(self) -> AuthToken {
        AuthToken::Legacy(self)
    }
}

/// Claims signed by a V1 token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct V1Claims {
    /// Challenge text the client signed.
    pub hub_challenge: String,
    /// Hub the token was minted for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_url: Option<String>,
    /// Issuer public key, hex.
    pub iss: String,
    /// Random salt so identical claims yield distinct tokens.
    pub salt: String,
    /// Serialized association token delegating to `iss`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub association_token: Option<String>,
    /// Write scopes; absent means full access.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<Scope>>,
    /// Issue time, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiry time, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// V1 token. Its claims are untrusted until [`V1Token::verify_signature`] passes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct V1Token {
    claims: V1Claims,
    public_key: PublicKey,
    encoded: CompactToken,
}

impl V1Token {
    /// Start building a token signed by `keypair` over `challenge`.
    pub fn builder<'a>(keypair: &'a KeyPair, challenge: impl Into<String>) -> V1TokenBuilder<'a> {
        V1TokenBuilder::new(keypair, challenge)
    }

    fn decode(token: &str) -> Result<Self> {
        let body = token
            .strip_prefix(V1_PREFIX)
            .ok_or_else(|| HubError::MalformedAuthToken(format!("missing {} prefix", V1_PREFIX)))?;
        let encoded = CompactToken::decode(body)?;
        let claims: V1Claims = serde_json::from_slice(encoded.claims())
            .map_err(|e| HubError::MalformedAuthToken(format!("invalid claims: {}", e)))?;
        let public_key: PublicKey = claims
            .iss
            .parse()
            .map_err(|e| HubError::MalformedAuthToken(format!("invalid issuer: {}", e)))?;
        Ok(Self {
            claims,
            public_key,
            encoded,
        })
    }

    /// Signing key named by `iss`.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Decoded claims.
    pub fn claims(&self) -> &V1Claims {
        &self.claims
    }

    /// Declared scopes, in token order.
    pub fn scopes(&self) -> &[Scope] {
        self.claims.scopes.as_deref().unwrap_or(&[])
    }

    /// Whether the claims were signed by `iss`.
    pub fn verify_signature(&self) -> bool {
        self.encoded.verify(&self.public_key)
    }

    /// Wrap as an [`AuthToken`].
    pub fn into_token(self) -> AuthToken {
        AuthToken::V1(self)
    }
}

/// Builder for V1 tokens. Issue time defaults to now.
#[derive(Debug)]
pub struct V1TokenBuilder<'a> {
    keypair: &'a KeyPair,
    challenge: String,
    hub_url: Option<String>,
    association_token: Option<String>,
    scopes: Option<Vec<Scope>>,
    issued_at: Option<i64>,
    expires_at: Option<i64>,
}

impl<'a> V1TokenBuilder<'a> {
    fn new(keypair: &'a KeyPair, challenge: impl Into<String>) -> Self {
        Self {
            keypair,
            challenge: challenge.into(),
            hub_url: None,
            association_token: None,
            scopes: None,
            issued_at: Some(chrono::Utc::now().timestamp()),
            expires_at: None,
        }
    }

    /// Claim the hub this token is meant for.
    pub fn hub_url(mut self, hub_url: impl Into<String>) -> Self {
        self.hub_url = Some(hub_url.into());
        self
    }

    /// Write into the namespace of the association token's signer.
    pub fn association_token(mut self, token: &AssociationToken) -> Self {
        self.association_token = Some(token.serialize().to_string());
        self
    }

    /// Restrict writes to `scopes`.
    pub fn scopes(mut self, scopes: Vec<Scope>) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Override the issue time.
    pub fn issued_at(mut self, issued_at: i64) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    /// Omit the issue time claim.
    pub fn without_issued_at(mut self) -> Self {
        self.issued_at = None;
        self
    }

    /// Set an expiry time.
    pub fn expires_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Sign the claims.
    pub fn build(self) -> Result<AuthToken> {
        let public_key = self.keypair.public_key();
        let claims = V1Claims {
            hub_challenge: self.challenge,
            hub_url: self.hub_url,
            iss: public_key.to_hex(),
            salt: super::random_salt(),
            association_token: self.association_token,
            scopes: self.scopes,
            iat: self.issued_at,
            exp: self.expires_at,
        };
        let encoded = CompactToken::sign(self.keypair, &claims)?;
        Ok(AuthToken::V1(V1Token {
            claims,
            public_key,
            encoded,
        }))
    }
}
