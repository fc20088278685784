use crate::models::AuthData;
use std::fmt;
use std::time::Duration;

/// Opaque Vault credential
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for Token {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// Token obtained through a login, carrying its lease.
///
/// A zero `lease_duration` means the backend reported no expiry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoginToken {
    token: Token,
    lease_duration: Duration,
    renewable: bool,
}

impl LoginToken {
    pub fn new(token: impl Into<Token>, lease_duration: Duration, renewable: bool) -> Self {
        Self {
            token: token.into(),
            lease_duration,
            renewable,
        }
    }

    /// Non-renewable login token without lease information
    pub fn of(token: impl Into<Token>) -> Self {
        Self::new(token, Duration::ZERO, false)
    }

    /// Renewable login token with a lease of `lease_seconds`
    pub fn renewable(token: impl Into<Token>, lease_seconds: u64) -> Self {
        Self::new(token, Duration::from_secs(lease_seconds), true)
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn lease_duration(&self) -> Duration {
        self.lease_duration
    }

    pub fn is_renewable(&self) -> bool {
        self.renewable
    }
}

impl From<AuthData> for LoginToken {
    fn from(auth: AuthData) -> Self {
        Self::new(
            auth.client_token,
            Duration::from_secs(auth.lease_duration),
            auth.renewable,
        )
    }
}

/// Token handed out by authentication strategies and the session manager
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VaultToken {
    /// Bare token without lease metadata
    Token(Token),
    /// Token obtained through a login
    Login(LoginToken),
}

impl VaultToken {
    pub fn token(&self) -> &Token {
        match self {
            VaultToken::Token(token) => token,
            VaultToken::Login(login) => login.token(),
        }
    }

    pub fn as_str(&self) -> &str {
        self.token().as_str()
    }

    pub fn as_login(&self) -> Option<&LoginToken> {
        match self {
            VaultToken::Login(login) => Some(login),
            VaultToken::Token(_) => None,
        }
    }

    /// Only renewable login tokens are ever scheduled for renewal
    pub fn is_renewable(&self) -> bool {
        self.as_login().is_some_and(LoginToken::is_renewable)
    }

    pub fn lease_duration(&self) -> Duration {
        self.as_login()
            .map(LoginToken::lease_duration)
            .unwrap_or(Duration::ZERO)
    }
}

impl From<Token> for VaultToken {
    fn from(token: Token) -> Self {
        VaultToken::Token(token)
    }
}

impl From<LoginToken> for VaultToken {
    fn from(login: LoginToken) -> Self {
        VaultToken::Login(login)
    }
}
