use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Generic Vault response envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultResponse {
    #[serde(default)]
    pub data: Option<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub auth: Option<AuthData>,
    #[serde(default)]
    pub wrap_info: Option<WrapInfo>,
    #[serde(default)]
    pub warnings: Option<Vec<String>>,
}

/// Authentication block returned by login and renew endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthData {
    pub client_token: String,
    #[serde(default)]
    pub lease_duration: u64,
    #[serde(default)]
    pub renewable: bool,
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default)]
    pub accessor: Option<String>,
}

/// Response-wrapping metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrapInfo {
    pub token: String,
    #[serde(default)]
    pub ttl: u64,
    #[serde(default)]
    pub creation_path: Option<String>,
}

/// Error body, `{"errors": ["..."]}`
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ErrorResponse {
    /// Extract the Vault error text from a response body, falling back to the
    /// raw body when it is not a Vault error document.
    pub fn message_from(body: &str) -> String {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(resp) if !resp.errors.is_empty() => resp.errors.join(", "),
            _ => body.trim().to_string(),
        }
    }
}
