use super::ClientAuthentication;
use crate::VaultError;
use crate::client::VaultClient;
use crate::token::{Token, VaultToken};
use async_trait::async_trait;

/// Static token authentication
pub struct TokenAuthentication {
    token: Token,
}

impl TokenAuthentication {
    pub fn new(token: impl Into<Token>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl ClientAuthentication for TokenAuthentication {
    async fn login(&self, _client: &VaultClient) -> Result<VaultToken, VaultError> {
        Ok(VaultToken::Token(self.token.clone()))
    }
}
