//! Token command - mint a bearer token

use anyhow::{anyhow, bail, Result};
use hubkit_lib::{AssociationToken, ChallengeTextProvider, KeyPair, LegacyToken, Scope, V1Token};

use crate::ui;

/// Flags for `hubkit token`.
pub struct TokenOptions {
    pub legacy: bool,
    pub legacy_2018: bool,
    pub hub_url: Option<String>,
    pub scopes: Vec<String>,
    pub issued_at: Option<i64>,
    pub no_issued_at: bool,
    pub expires_at: Option<i64>,
    pub associate_secret: Option<String>,
}

pub fn run(secret: &str, server_name: &str, options: TokenOptions, verbose: bool) -> Result<()> {
    let keypair = KeyPair::from_secret_hex(secret)?;
    let challenges = ChallengeTextProvider::new(server_name);

    let token = if options.legacy {
        if options.hub_url.is_some() || !options.scopes.is_empty() {
            bail!("legacy tokens cannot carry a hub URL or scopes");
        }
        let challenge = if options.legacy_2018 {
            challenges.legacy_2018()
        } else {
            challenges.current()
        };
        LegacyToken::build(&keypair, &challenge).into_token()
    } else {
        let mut builder = V1Token::builder(&keypair, challenges.current());
        if let Some(hub_url) = options.hub_url {
            builder = builder.hub_url(hub_url);
        }
        if !options.scopes.is_empty() {
            let scopes = options
                .scopes
                .iter()
                .map(|raw| parse_scope(raw))
                .collect::<Result<Vec<_>>>()?;
            builder = builder.scopes(scopes);
        }
        if let Some(issued_at) = options.issued_at {
            builder = builder.issued_at(issued_at);
        }
        if options.no_issued_at {
            builder = builder.without_issued_at();
        }
        if let Some(expires_at) = options.expires_at {
            builder = builder.expires_at(expires_at);
        }

        let association = match options.associate_secret {
            Some(parent_secret) => {
                let parent = KeyPair::from_secret_hex(&parent_secret)?;
                let association = AssociationToken::build(&parent, &keypair.public_key())?;
                if verbose {
                    ui::info(&format!("Delegating from {}", parent.address()));
                    if let Some(expires_at) = association.expires_at() {
                        ui::key_value("Delegation expires", &expires_at.to_string());
                    }
                }
                Some(association)
            }
            None => None,
        };
        if let Some(association) = &association {
            builder = builder.association_token(association);
        }
        builder.build()?
    };

    if verbose {
        ui::key_value("Signer", keypair.address().as_str());
    }
    println!("{}", token.to_header());
    Ok(())
}

/// Parse `putFile:<path>` or `putFilePrefix:<prefix>`.
pub fn parse_scope(raw: &str) -> Result<Scope> {
    let (kind, domain) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("scope {:?} must look like <kind>:<path>", raw))?;
    match kind {
        "putFile" => Ok(Scope::put_file(domain)),
        "putFilePrefix" => Ok(Scope::put_file_prefix(domain)),
        other => bail!("unknown scope kind {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubkit_lib::ScopeKind;

    #[test]
    fn test_parses_scope_kinds() {
        let scope = parse_scope("putFile:/foo/bar").unwrap();
        assert_eq!(scope.kind, ScopeKind::PutFile);
        assert_eq!(scope.domain, "/foo/bar");

        let scope = parse_scope("putFilePrefix:baz").unwrap();
        assert_eq!(scope.kind, ScopeKind::PutFilePrefix);
        assert_eq!(scope.domain, "baz");
    }

    #[test]
    fn test_domain_may_contain_colons() {
        let scope = parse_scope("putFile:a:b").unwrap();
        assert_eq!(scope.domain, "a:b");
    }

    #[test]
    fn test_rejects_unknown_scopes() {
        assert!(parse_scope("deleteFile:x").is_err());
        assert!(parse_scope("putFile").is_err());
    }
}
