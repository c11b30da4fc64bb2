//! Bearer-token authentication.
//!
//! A client proves control of an address by signing one of the hub's
//! challenge texts. [`AuthToken`] handles the wire encodings,
//! [`Authenticator`] decides whether a token may write to an address, and
//! [`authorize`] applies the token's scopes to a path.

mod association;
mod authenticator;
mod compact;
mod scopes;
mod token;

pub use association::{AssociationToken, DEFAULT_ASSOCIATION_LIFETIME_SECS};
pub use authenticator::{normalize_hub_url, Authenticator, IssueTime, ValidationOptions};
pub use scopes::{authorize, validate_scopes, Scope, ScopeKind, MAX_SCOPES};
pub use token::{
    AuthToken, LegacyToken, V1Claims, V1Token, V1TokenBuilder, BEARER_SCHEME, V1_PREFIX,
};

/// Random hex salt for freshly signed claims.
fn random_salt() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}
