//! Identity verification
//!
//! Credential issuance lives outside the relay. Whatever issues tokens
//! plugs in behind [`IdentityProvider`]; the relay only needs the stable
//! identity a token stands for.

use crate::config::AuthConfig;
use crate::domain::shared::value_objects::UserId;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Identity vouched for by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub identity: UserId,
    pub display_name: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing credentials")]
    MissingToken,

    #[error("invalid credentials")]
    InvalidToken,

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Identity provider trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer token to the identity it was issued for
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError>;
}

/// Provider backed by a fixed token table from configuration
pub struct StaticTokenProvider {
    tokens: HashMap<String, VerifiedIdentity>,
}

impl StaticTokenProvider {
    pub fn new(tokens: HashMap<String, VerifiedIdentity>) -> Self {
        Self { tokens }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let tokens = config
            .tokens
            .iter()
            .map(|(token, grant)| {
                (
                    token.clone(),
                    VerifiedIdentity {
                        identity: UserId::new(grant.identity.trim()),
                        display_name: grant.display_name.clone(),
                    },
                )
            })
            .collect();
        Self::new(tokens)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenGrant;

    fn provider() -> StaticTokenProvider {
        let mut tokens = HashMap::new();
        tokens.insert(
            "secret-a".to_string(),
            TokenGrant {
                identity: "alice".to_string(),
                display_name: "Alice".to_string(),
            },
        );
        StaticTokenProvider::from_config(&AuthConfig {
            enabled: true,
            tokens,
        })
    }

    #[tokio::test]
    async fn test_verify_known_token() {
        let verified = provider().verify("secret-a").await.unwrap();
        assert_eq!(verified.identity, UserId::new("alice"));
        assert_eq!(verified.display_name, "Alice");
    }

    #[tokio::test]
    async fn test_verify_unknown_and_empty_token() {
        let provider = provider();
        assert_eq!(
            provider.verify("nope").await.unwrap_err(),
            AuthError::InvalidToken
        );
        assert_eq!(provider.verify("").await.unwrap_err(), AuthError::MissingToken);
    }
}
