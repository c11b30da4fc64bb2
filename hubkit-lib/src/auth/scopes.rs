//! Write scopes carried by V1 tokens.
//!
//! A token without scopes has full write access to its namespace. Scoped
//! tokens may only write the paths their scopes name. Matching is purely
//! textual: a leading `/` on one side and not the other is not normalized
//! away, and the storage key is always `address + "/" + path`.

use serde::{Deserialize, Serialize};

use crate::{HubError, Result};

/// Maximum number of scopes a single token may declare.
pub const MAX_SCOPES: usize = 8;

/// Kind of write permission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScopeKind {
    /// Write exactly `domain`.
    PutFile,
    /// Write any path that starts with `domain`.
    PutFilePrefix,
}

/// A declared, limited write permission.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    /// Permission kind.
    #[serde(rename = "scope")]
    pub kind: ScopeKind,
    /// Path or path prefix the permission applies to.
    pub domain: String,
}

impl Scope {
    /// Permission to write exactly `path`.
    pub fn put_file(path: impl Into<String>) -> Self {
        Self {
            kind: ScopeKind::PutFile,
            domain: path.into(),
        }
    }

    /// Permission to write anything under `prefix`.
    pub fn put_file_prefix(prefix: impl Into<String>) -> Self {
        Self {
            kind: ScopeKind::PutFilePrefix,
            domain: prefix.into(),
        }
    }

    /// Whether this scope grants a write to `path`.
    pub fn permits(&self, path: &str) -> bool {
        match self.kind {
            ScopeKind::PutFile => self.domain == path,
            ScopeKind::PutFilePrefix => path.starts_with(&self.domain),
        }
    }
}

/// Decide whether `scopes` allow a write to `path`.
///
/// An empty scope list grants everything.
pub fn authorize(scopes: &[Scope], path: &str) -> bool {
    scopes.is_empty() || scopes.iter().any(|scope| scope.permits(path))
}

/// Check the structural limits on a token's scope list.
pub fn validate_scopes(scopes: &[Scope]) -> Result<()> {
    if scopes.len() > MAX_SCOPES {
        return Err(HubError::validation(format!(
            "too many authentication scopes: {} (maximum {})",
            scopes.len(),
            MAX_SCOPES
        )));
    }
    if let Some(scope) = scopes.iter().find(|s| s.domain.is_empty()) {
        return Err(HubError::validation(format!(
            "scope {:?} has an empty domain",
            scope.kind
        )));
    }
    Ok(())
}
