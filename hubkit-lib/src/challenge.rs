//! Challenge texts that clients sign to prove key possession.
//!
//! Challenges are a pure function of the server name, so every hub instance
//! started with the same name accepts the same set without coordination.

const CHALLENGE_HEADER: &str = "gaiahub";
const CHALLENGE_BODY: &str = "blockstack_storage_please_sign";
const CURRENT_SPAN: &str = "0";

/// Span used by the 2018 protocol migration.
pub const LEGACY_2018_SPAN: &str = "2018";

/// Historical spans still accepted, oldest first.
pub const LEGACY_SPANS: &[&str] = &[LEGACY_2018_SPAN, "2019"];

/// Produces the challenge texts bound to one server name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChallengeTextProvider {
    server_name: String,
}

impl ChallengeTextProvider {
    /// Create a provider for `server_name`.
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
        }
    }

    /// The server name this provider is bound to.
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// The challenge new clients should sign.
    pub fn current(&self) -> String {
        challenge_text(CURRENT_SPAN, &self.server_name)
    }

    /// Historical challenges still accepted, in [`LEGACY_SPANS`] order.
    pub fn legacy(&self) -> Vec<String> {
        LEGACY_SPANS
            .iter()
            .map(|span| challenge_text(span, &self.server_name))
            .collect()
    }

    /// The 2018 migration challenge.
    pub fn legacy_2018(&self) -> String {
        challenge_text(LEGACY_2018_SPAN, &self.server_name)
    }

    /// Current challenge followed by every legacy challenge.
    pub fn accepted(&self) -> Vec<String> {
        let mut accepted = Vec::with_capacity(1 + LEGACY_SPANS.len());
        accepted.push(self.current());
        accepted.extend(self.legacy());
        accepted
    }
}

fn challenge_text(span: &str, server_name: &str) -> String {
    serde_json::Value::from(vec![CHALLENGE_HEADER, span, server_name, CHALLENGE_BODY]).to_string()
}
