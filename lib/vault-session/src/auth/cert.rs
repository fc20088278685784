use super::{ClientAuthentication, login_with};
use crate::VaultError;
use crate::client::VaultClient;
use crate::token::VaultToken;
use async_trait::async_trait;

const DEFAULT_MOUNT: &str = "cert";

/// TLS client certificate authentication.
///
/// The client identity travels in the TLS handshake, so the [`VaultClient`]
/// passed to `login` must be built on a `reqwest::Client` carrying it.
pub struct ClientCertificateAuthentication {
    mount: String,
}

impl Default for ClientCertificateAuthentication {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientCertificateAuthentication {
    pub fn new() -> Self {
        Self {
            mount: DEFAULT_MOUNT.to_string(),
        }
    }

    pub fn with_mount(mut self, mount: impl Into<String>) -> Self {
        self.mount = mount.into();
        self
    }
}

#[async_trait]
impl ClientAuthentication for ClientCertificateAuthentication {
    async fn login(&self, client: &VaultClient) -> Result<VaultToken, VaultError> {
        login_with(client, &self.mount, &serde_json::json!({}), "TLS certificates").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::LoginToken;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_login() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/cert/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "auth": {"client_token": "cert-token", "lease_duration": 60, "renewable": false}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let token = ClientCertificateAuthentication::new()
            .login(&VaultClient::new(mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(
            token,
            VaultToken::Login(LoginToken::new("cert-token", Duration::from_secs(60), false))
        );
    }

    #[tokio::test]
    async fn test_login_without_auth_block_fails() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/tls/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": {}})))
            .mount(&mock_server)
            .await;

        let result = ClientCertificateAuthentication::new()
            .with_mount("tls")
            .login(&VaultClient::new(mock_server.uri()))
            .await;

        assert!(matches!(result, Err(VaultError::AuthError(_))));
    }

    #[tokio::test]
    async fn test_login_server_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/cert/login"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let result = ClientCertificateAuthentication::new()
            .login(&VaultClient::new(mock_server.uri()))
            .await;

        assert!(matches!(result, Err(VaultError::AuthError(_))));
    }
}
