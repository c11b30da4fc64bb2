//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use hubkit_lib::prelude::*;
//! ```

// Server
pub use crate::config::HubConfig;
pub use crate::server::{header_value, Headers, HubServer};

// Error handling
pub use crate::errors::{HubError, HubErrorCode};
pub use crate::Result;

// Tokens
pub use crate::auth::{
    authorize, AssociationToken, AuthToken, Authenticator, LegacyToken, Scope, ScopeKind,
    V1Token,
};
pub use crate::challenge::ChallengeTextProvider;
pub use crate::crypto::{Address, KeyPair, PublicKey};

// Pluggable backends
pub use crate::driver::{ContentStream, Driver, ListFilesResult, WriteDescriptor};
pub use crate::proof::{AcceptAllProofs, ProofChecker, ProofPolicy};
pub use crate::revocation::RevocationRegistry;
