use super::{ClientAuthentication, CubbyholeAuthenticationOptions};
use crate::VaultError;
use crate::client::VaultClient;
use crate::models::VaultResponse;
use crate::token::{LoginToken, Token, VaultToken};
use async_trait::async_trait;
use std::collections::HashMap;

const WRAPPED_RESPONSE_FIELD: &str = "response";

/// Cubbyhole authentication.
///
/// Reads a token handed over through a cubbyhole using the initial token.
/// In wrapped mode the cubbyhole holds a serialized login response whose
/// `auth` block yields a [`LoginToken`]; otherwise the cubbyhole must hold
/// exactly one entry whose value is the token itself.
pub struct CubbyholeAuthentication {
    options: CubbyholeAuthenticationOptions,
}

impl CubbyholeAuthentication {
    pub fn new(options: CubbyholeAuthenticationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CubbyholeAuthenticationOptions {
        &self.options
    }

    fn error(&self, reason: &str) -> VaultError {
        VaultError::AuthError(format!(
            "Cannot retrieve token from cubbyhole: {} at {}",
            reason,
            self.options.path()
        ))
    }

    fn token_from(&self, data: HashMap<String, serde_json::Value>) -> Result<VaultToken, VaultError> {
        if self.options.is_wrapped_token() {
            return self.unwrap_login(data);
        }

        if data.len() > 1 {
            return Err(self.error("ambiguous token, response contains more than one entry"));
        }

        match data.into_values().next() {
            None => Err(self.error("no token present")),
            Some(serde_json::Value::String(token)) => Ok(VaultToken::Token(Token::new(token))),
            Some(_) => Err(self.error("token value is not a string")),
        }
    }

    fn unwrap_login(&self, mut data: HashMap<String, serde_json::Value>) -> Result<VaultToken, VaultError> {
        let wrapped = match data.remove(WRAPPED_RESPONSE_FIELD) {
            Some(serde_json::Value::String(wrapped)) if data.is_empty() => wrapped,
            _ => return Err(self.error("missing wrapped response")),
        };

        let response: VaultResponse = serde_json::from_str(&wrapped)
            .map_err(|e| self.error(&format!("cannot deserialize wrapped response ({})", e)))?;

        response
            .auth
            .map(|auth| VaultToken::Login(LoginToken::from(auth)))
            .ok_or_else(|| self.error("wrapped response does not contain auth data"))
    }
}

#[async_trait]
impl ClientAuthentication for CubbyholeAuthentication {
    async fn login(&self, client: &VaultClient) -> Result<VaultToken, VaultError> {
        let response = client
            .get(self.options.path(), Some(self.options.initial_token()))
            .await
            .map_err(|e| {
                VaultError::AuthError(format!(
                    "Cannot retrieve token from cubbyhole: {}",
                    e.describe()
                ))
            })?;

        let token = self.token_from(response.data.unwrap_or_default())?;
        tracing::debug!("Login successful using Cubbyhole authentication");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn stored(path: &str) -> CubbyholeAuthentication {
        CubbyholeAuthentication::new(
            CubbyholeAuthenticationOptions::builder()
                .initial_token("initial")
                .path(path)
                .build()
                .unwrap(),
        )
    }

    fn wrapped() -> CubbyholeAuthentication {
        CubbyholeAuthentication::new(
            CubbyholeAuthenticationOptions::builder()
                .initial_token("wrapping")
                .wrapped()
                .build()
                .unwrap(),
        )
    }

    async fn serve_data(mock_server: &MockServer, at: &str, token: &str, data: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(at))
            .and(header("authorization", format!("Bearer {}", token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "request_id": "req",
                "lease_duration": 0,
                "renewable": false,
                "data": data
            })))
            .expect(1)
            .mount(mock_server)
            .await;
    }

    fn auth_error_message(result: Result<VaultToken, VaultError>) -> String {
        match result {
            Err(VaultError::AuthError(message)) => message,
            other => panic!("expected AuthError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wrapped_response_yields_login_token() {
        let mock_server = MockServer::start().await;
        let wrapped_login = serde_json::json!({
            "auth": {
                "client_token": "unwrapped-token",
                "lease_duration": 3600,
                "renewable": true
            }
        })
        .to_string();
        serve_data(
            &mock_server,
            "/v1/cubbyhole/response",
            "wrapping",
            serde_json::json!({ "response": wrapped_login }),
        )
        .await;

        let token = wrapped()
            .login(&VaultClient::new(mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(
            token,
            VaultToken::Login(LoginToken::new("unwrapped-token", Duration::from_secs(3600), true))
        );
    }

    #[tokio::test]
    async fn test_stored_single_entry_yields_bare_token() {
        let mock_server = MockServer::start().await;
        serve_data(
            &mock_server,
            "/v1/cubbyhole/token",
            "initial",
            serde_json::json!({ "k": "tok123" }),
        )
        .await;

        let token = stored("cubbyhole/token")
            .login(&VaultClient::new(mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(token, VaultToken::Token(Token::new("tok123")));
    }

    #[tokio::test]
    async fn test_stored_empty_data_fails() {
        let mock_server = MockServer::start().await;
        serve_data(&mock_server, "/v1/cubbyhole/token", "initial", serde_json::json!({})).await;

        let result = stored("cubbyhole/token")
            .login(&VaultClient::new(mock_server.uri()))
            .await;

        assert!(auth_error_message(result).contains("no token present"));
    }

    #[tokio::test]
    async fn test_stored_two_entries_fails() {
        let mock_server = MockServer::start().await;
        serve_data(
            &mock_server,
            "/v1/cubbyhole/token",
            "initial",
            serde_json::json!({ "a": "one", "b": "two" }),
        )
        .await;

        let result = stored("cubbyhole/token")
            .login(&VaultClient::new(mock_server.uri()))
            .await;

        assert!(auth_error_message(result).contains("ambiguous token"));
    }

    #[tokio::test]
    async fn test_wrapped_mode_without_response_field_fails() {
        let mock_server = MockServer::start().await;
        serve_data(
            &mock_server,
            "/v1/cubbyhole/response",
            "wrapping",
            serde_json::json!({ "token": "plain" }),
        )
        .await;

        let result = wrapped().login(&VaultClient::new(mock_server.uri())).await;

        assert!(auth_error_message(result).contains("missing wrapped response"));
    }

    #[tokio::test]
    async fn test_permission_denied_carries_status_and_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/cubbyhole/response"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(serde_json::json!({ "errors": ["permission denied"] })),
            )
            .mount(&mock_server)
            .await;

        let result = wrapped().login(&VaultClient::new(mock_server.uri())).await;

        let message = auth_error_message(result);
        assert!(message.contains("Cannot retrieve token from cubbyhole"));
        assert!(message.contains("403"));
        assert!(message.contains("permission denied"));
    }
}
