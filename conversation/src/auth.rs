//! Identity verification seam.
//!
//! The engine only needs `opaque token -> stable user uid`; the real
//! verifier is an external service. [`StaticTokenVerifier`] implements
//! the seam from a configured token map for deployments and tests.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

/// Maps an opaque identity token to a stable user uid, or fails.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<String>;
}

/// Token map verifier: `AUTH_TOKENS=token1:uid1,token2:uid2`.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }

    /// Parses the `token:uid` comma list format used by AUTH_TOKENS.
    pub fn from_token_list(list: &str) -> Self {
        let tokens = list
            .split(',')
            .filter_map(|pair| {
                let (token, uid) = pair.split_once(':')?;
                let (token, uid) = (token.trim(), uid.trim());
                if token.is_empty() || uid.is_empty() {
                    None
                } else {
                    Some((token.to_string(), uid.to_string()))
                }
            })
            .collect();
        Self { tokens }
    }
}

#[async_trait]
impl IdentityVerifier for StaticTokenVerifier {
    async fn verify(&self, id_token: &str) -> Result<String> {
        self.tokens
            .get(id_token)
            .cloned()
            .ok_or_else(|| anyhow!("unknown identity token"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_token_resolves_unknown_fails() {
        let verifier = StaticTokenVerifier::from_token_list("tok-1:uid-1, tok-2:uid-2,malformed");
        assert_eq!(verifier.verify("tok-1").await.unwrap(), "uid-1");
        assert_eq!(verifier.verify("tok-2").await.unwrap(), "uid-2");
        assert!(verifier.verify("tok-3").await.is_err());
        assert!(verifier.verify("malformed").await.is_err());
    }
}
