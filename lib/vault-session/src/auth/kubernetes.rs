use super::{ClientAuthentication, login_with};
use crate::VaultError;
use crate::client::VaultClient;
use crate::token::VaultToken;
use async_trait::async_trait;
use serde::Serialize;

pub const DEFAULT_JWT_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
const DEFAULT_MOUNT: &str = "kubernetes";

/// Kubernetes service-account authentication
pub struct KubernetesAuthentication {
    mount: String,
    role: String,
    jwt_path: String,
}

impl KubernetesAuthentication {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            mount: DEFAULT_MOUNT.to_string(),
            role: role.into(),
            jwt_path: DEFAULT_JWT_PATH.to_string(),
        }
    }

    pub fn with_mount(mut self, mount: impl Into<String>) -> Self {
        self.mount = mount.into();
        self
    }

    pub fn with_jwt_path(mut self, path: impl Into<String>) -> Self {
        self.jwt_path = path.into();
        self
    }

    fn read_jwt(&self) -> Result<String, VaultError> {
        std::fs::read_to_string(&self.jwt_path)
            .map(|s| s.trim().to_string())
            .map_err(|e| {
                VaultError::AuthError(format!(
                    "Cannot read service account JWT from {}: {}",
                    self.jwt_path, e
                ))
            })
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    jwt: String,
    role: &'a str,
}

#[async_trait]
impl ClientAuthentication for KubernetesAuthentication {
    async fn login(&self, client: &VaultClient) -> Result<VaultToken, VaultError> {
        let request = LoginRequest {
            jwt: self.read_jwt()?,
            role: &self.role,
        };

        login_with(client, &self.mount, &request, "Kubernetes").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::LoginToken;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_read_jwt_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "my-jwt-token").unwrap();

        let auth = KubernetesAuthentication::new("app")
            .with_jwt_path(file.path().to_str().unwrap());

        assert_eq!(auth.read_jwt().unwrap(), "my-jwt-token");
    }

    #[test]
    fn test_read_jwt_missing_file() {
        let auth = KubernetesAuthentication::new("app").with_jwt_path("/nonexistent/path");
        assert!(matches!(auth.read_jwt(), Err(VaultError::AuthError(_))));
    }

    #[tokio::test]
    async fn test_login_posts_jwt_and_role() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "sa-jwt").unwrap();

        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/k8s/login"))
            .and(body_json(serde_json::json!({"jwt": "sa-jwt", "role": "app"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "auth": {"client_token": "k8s-token", "lease_duration": 600, "renewable": true}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let auth = KubernetesAuthentication::new("app")
            .with_mount("k8s")
            .with_jwt_path(file.path().to_str().unwrap());

        let token = auth.login(&VaultClient::new(mock_server.uri())).await.unwrap();
        assert_eq!(token, VaultToken::Login(LoginToken::renewable("k8s-token", 600)));
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "sa-jwt").unwrap();

        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/kubernetes/login"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"errors": ["invalid role name"]})),
            )
            .mount(&mock_server)
            .await;

        let auth = KubernetesAuthentication::new("missing")
            .with_jwt_path(file.path().to_str().unwrap());

        let result = auth.login(&VaultClient::new(mock_server.uri())).await;
        match result {
            Err(VaultError::AuthError(message)) => {
                assert!(message.contains("400"));
                assert!(message.contains("invalid role name"));
            }
            other => panic!("expected AuthError, got {:?}", other),
        }
    }
}
