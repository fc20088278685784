use crate::VaultError;
use crate::token::Token;

/// Path where Vault stores wrapped responses for a wrapping token
pub const WRAPPED_RESPONSE_PATH: &str = "cubbyhole/response";

/// Immutable options for [`super::CubbyholeAuthentication`]
#[derive(Debug, Clone)]
pub struct CubbyholeAuthenticationOptions {
    initial_token: Token,
    path: String,
    wrapped_token: bool,
}

impl CubbyholeAuthenticationOptions {
    pub fn builder() -> CubbyholeAuthenticationOptionsBuilder {
        CubbyholeAuthenticationOptionsBuilder::default()
    }

    /// Token used to read the cubbyhole
    pub fn initial_token(&self) -> &Token {
        &self.initial_token
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// `true` when the cubbyhole holds a wrapped login response, `false` when
    /// the token is stored directly in the `data` section
    pub fn is_wrapped_token(&self) -> bool {
        self.wrapped_token
    }
}

#[derive(Debug, Default)]
pub struct CubbyholeAuthenticationOptionsBuilder {
    initial_token: Option<Token>,
    path: Option<String>,
    wrapped_token: bool,
}

impl CubbyholeAuthenticationOptionsBuilder {
    pub fn initial_token(mut self, token: impl Into<Token>) -> Self {
        self.initial_token = Some(token.into());
        self
    }

    /// Cubbyhole path such as `cubbyhole/token` holding the token in `data`
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self.wrapped_token = false;
        self
    }

    /// Read a wrapped login response from `cubbyhole/response`
    pub fn wrapped(mut self) -> Self {
        self.path = Some(WRAPPED_RESPONSE_PATH.to_string());
        self.wrapped_token = true;
        self
    }

    pub fn build(self) -> Result<CubbyholeAuthenticationOptions, VaultError> {
        let initial_token = self.initial_token.ok_or_else(|| {
            VaultError::Configuration("Cubbyhole initial token must not be empty".to_string())
        })?;
        if initial_token.as_str().trim().is_empty() {
            return Err(VaultError::Configuration(
                "Cubbyhole initial token must not be empty".to_string(),
            ));
        }

        let path = match self.path {
            Some(path) if !path.trim().is_empty() => path,
            _ => {
                return Err(VaultError::Configuration(
                    "Cubbyhole path must not be empty".to_string(),
                ));
            }
        };

        Ok(CubbyholeAuthenticationOptions {
            initial_token,
            path,
            wrapped_token: self.wrapped_token,
        })
    }
}
