//! Hubkit library.
//!
//! Authentication core of a personal storage gateway. Clients write into
//! their own address namespace by presenting a bearer token that signs one
//! of the hub's challenge texts; the hub verifies it and hands the body to a
//! pluggable storage [`Driver`].
//!
//! # Features
//!
//! - **Token formats**: legacy signed-challenge tokens and `v1:` compact tokens
//! - **Delegation**: association tokens let a parent key authorize a child key
//! - **Scopes**: restrict a token to exact paths or path prefixes
//! - **Revocation**: per-address floors that invalidate older tokens
//!
//! # Example
//!
//! ```ignore
//! use hubkit_lib::{HubConfig, HubServer, KeyPair, V1Token};
//!
//! let hub = HubServer::new(HubConfig::new("hub.example.com"), driver)?;
//! let keypair = KeyPair::random();
//! let token = V1Token::builder(&keypair, hub.challenges().current()).build()?;
//!
//! let headers = [("authorization".to_string(), token.to_header())].into();
//! let url = hub
//!     .handle_request(keypair.address().as_str(), "hello.txt", &headers, body)
//!     .await?;
//! ```

pub mod auth;
pub mod challenge;
pub mod config;
pub mod crypto;
pub mod driver;
pub mod errors;
pub mod prelude;
pub mod proof;
pub mod revocation;
pub mod server;

pub use auth::{
    AssociationToken, AuthToken, Authenticator, IssueTime, LegacyToken, Scope, ScopeKind,
    V1Token,
};
pub use challenge::ChallengeTextProvider;
pub use config::HubConfig;
pub use crypto::{Address, KeyPair, PublicKey};
pub use driver::{ContentStream, Driver, ListFilesResult, WriteDescriptor};
pub use errors::{HubError, HubErrorCode};
pub use proof::{AcceptAllProofs, ProofChecker, ProofPolicy};
pub use revocation::RevocationRegistry;
pub use server::{Headers, HubServer};

/// Common result alias for hub operations.
pub type Result<T> = std::result::Result<T, HubError>;
