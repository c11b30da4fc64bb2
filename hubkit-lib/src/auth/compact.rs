//! Compact `header.claims.signature` encoding shared by V1 and association tokens.
//!
//! Each segment is unpadded base64url. The signature covers the ASCII bytes of
//! `header.claims` exactly as received, so decoded tokens keep their raw text.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::crypto::{self, KeyPair, PublicKey};
use crate::{HubError, Result};

const TOKEN_TYPE: &str = "JWT";
const ALGORITHM: &str = "EdDSA";

#[derive(Serialize, Deserialize)]
struct Header {
    typ: String,
    alg: String,
}

/// A decoded compact token whose signature has not been checked yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CompactToken {
    raw: String,
    signing_input_len: usize,
    claims: Vec<u8>,
    signature: Vec<u8>,
}

impl CompactToken {
    /// Serialize `claims` and sign them with `keypair`.
    pub(crate) fn sign<T: Serialize>(keypair: &KeyPair, claims: &T) -> Result<Self> {
        let header = serde_json::to_vec(&Header {
            typ: TOKEN_TYPE.into(),
            alg: ALGORITHM.into(),
        })
        .map_err(|e| HubError::MalformedAuthToken(e.to_string()))?;
        let claims =
            serde_json::to_vec(claims).map_err(|e| HubError::MalformedAuthToken(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&header),
            URL_SAFE_NO_PAD.encode(&claims)
        );
        let signature = crypto::sign(keypair, signing_input.as_bytes());
        let signing_input_len = signing_input.len();
        let raw = format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature));

        Ok(Self {
            raw,
            signing_input_len,
            claims,
            signature: signature.to_vec(),
        })
    }

    /// Split and decode a compact token.
    pub(crate) fn decode(raw: &str) -> Result<Self> {
        let mut parts = raw.split('.');
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed("expected three dot-separated segments"));
        };

        let header: Header = serde_json::from_slice(&decode_segment(header, "header")?)
            .map_err(|e| malformed(format!("invalid header: {}", e)))?;
        if header.alg != ALGORITHM {
            return Err(malformed(format!("unsupported algorithm {:?}", header.alg)));
        }

        Ok(Self {
            raw: raw.to_string(),
            signing_input_len: raw.len() - signature.len() - 1,
            claims: decode_segment(claims, "claims")?,
            signature: decode_segment(signature, "signature")?,
        })
    }

    /// Decoded claims JSON.
    pub(crate) fn claims(&self) -> &[u8] {
        &self.claims
    }

    /// The token exactly as it was produced or received.
    pub(crate) fn as_str(&self) -> &str {
        &self.raw
    }

    /// Check the signature under `public_key`.
    pub(crate) fn verify(&self, public_key: &PublicKey) -> bool {
        let signing_input = &self.raw.as_bytes()[..self.signing_input_len];
        crypto::verify(public_key, signing_input, &self.signature)
    }
}

fn decode_segment(segment: &str, name: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| malformed(format!("{} is not base64url: {}", name, e)))
}

fn malformed(msg: impl Into<String>) -> HubError {
    HubError::MalformedAuthToken(msg.into())
}
