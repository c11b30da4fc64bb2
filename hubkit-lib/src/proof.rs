//! Social-proof checking hook.
//!
//! The hub treats proof checking as a replaceable policy. By default a
//! failed check is only logged; [`ProofPolicy::Enforced`] turns it into a
//! gate that runs before the write.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::BoxError;

/// Whether proof failures block writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProofPolicy {
    /// Check alongside the write; failures are logged.
    #[default]
    Advisory,
    /// Check before the write; failures abort it.
    Enforced,
}

/// External validator of an address's identity proofs.
#[async_trait]
pub trait ProofChecker: Send + Sync {
    /// Resolve if `address` has an acceptable proof state for writing `path`.
    async fn check_proofs(
        &self,
        address: &str,
        path: &str,
        read_url_prefix: &str,
    ) -> std::result::Result<(), BoxError>;
}

/// Proof checker that accepts every address.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAllProofs;

#[async_trait]
impl ProofChecker for AcceptAllProofs {
    async fn check_proofs(
        &self,
        _address: &str,
        _path: &str,
        _read_url_prefix: &str,
    ) -> std::result::Result<(), BoxError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accept_all_accepts() {
        AcceptAllProofs
            .check_proofs("addr", "a.txt", "https://read/")
            .await
            .unwrap();
    }

    #[test]
    fn test_policy_wire_format() {
        assert_eq!(
            serde_json::to_string(&ProofPolicy::Enforced).unwrap(),
            "\"enforced\""
        );
        assert_eq!(ProofPolicy::default(), ProofPolicy::Advisory);
    }
}
