use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Vault not detected: VAULT_ADDR not set")]
    VaultNotDetected,

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Vault client error ({status}): {message}")]
    ClientError { status: u16, message: String },

    #[error("Vault request error: {0}")]
    RequestError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Session manager has been destroyed")]
    SessionDestroyed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VaultError {
    /// Describe a failed HTTP exchange as `<status> <message>` for embedding
    /// into authentication errors.
    pub(crate) fn describe(&self) -> String {
        match self {
            VaultError::ClientError { status, message } => format!("{} {}", status, message),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        let err = VaultError::ClientError {
            status: 403,
            message: "permission denied".to_string(),
        };
        assert_eq!(err.to_string(), "Vault client error (403): permission denied");
        assert_eq!(err.describe(), "403 permission denied");
    }

    #[test]
    fn test_describe_other_errors() {
        let err = VaultError::RequestError("connection refused".to_string());
        assert_eq!(err.describe(), "Vault request error: connection refused");
    }
}
