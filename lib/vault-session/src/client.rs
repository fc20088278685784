use crate::error::VaultError;
use crate::models::{ErrorResponse, VaultResponse};
use crate::token::Token;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct VaultClientBuilder {
    base_url: Option<String>,
    application_name: Option<String>,
    timeout: Duration,
    http: Option<reqwest::Client>,
}

impl Default for VaultClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VaultClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            application_name: None,
            timeout: DEFAULT_TIMEOUT,
            http: None,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sent as `User-Agent` on every request
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a preconfigured HTTP client, e.g. one carrying a TLS client
    /// identity for certificate authentication. Timeout and application
    /// name are ignored in that case.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<VaultClient, VaultError> {
        let base_url = self
            .base_url
            .or_else(|| std::env::var("VAULT_ADDR").ok())
            .ok_or(VaultError::VaultNotDetected)?;

        let http = match self.http {
            Some(http) => http,
            None => {
                let mut builder = reqwest::Client::builder().timeout(self.timeout);
                if let Some(app_name) = self.application_name {
                    builder = builder.user_agent(app_name);
                }
                builder
                    .build()
                    .map_err(|e| VaultError::Configuration(format!("HTTP client: {}", e)))?
            }
        };

        Ok(VaultClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }
}

/// Thin HTTP access to the Vault API rooted at `<base_url>/v1/`
#[derive(Clone)]
pub struct VaultClient {
    base_url: String,
    http: reqwest::Client,
}

impl VaultClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Client whose requests fail once `timeout` elapses
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn builder() -> VaultClientBuilder {
        VaultClientBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of an API path such as `auth/token/renew-self`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get(&self, path: &str, token: Option<&Token>) -> Result<VaultResponse, VaultError> {
        let mut request = self.http.get(self.endpoint(path));
        if let Some(token) = token {
            request = request.bearer_auth(token.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| VaultError::RequestError(e.to_string()))?;

        read_response(response)
            .await?
            .ok_or_else(|| VaultError::RequestError(format!("Empty response from {}", path)))
    }

    /// POST a JSON body. Returns `None` for responses without a body (204).
    pub async fn post<B>(
        &self,
        path: &str,
        token: Option<&Token>,
        body: &B,
    ) -> Result<Option<VaultResponse>, VaultError>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self.http.post(self.endpoint(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| VaultError::RequestError(e.to_string()))?;

        read_response(response).await
    }

    /// GET a plain-text document from an absolute URL outside the Vault API
    pub async fn fetch_text(&self, url: &str) -> Result<String, VaultError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| VaultError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(VaultError::ClientError {
                status,
                message: body,
            });
        }

        response
            .text()
            .await
            .map_err(|e| VaultError::RequestError(e.to_string()))
    }
}

async fn read_response(response: reqwest::Response) -> Result<Option<VaultResponse>, VaultError> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(VaultError::ClientError {
            status,
            message: ErrorResponse::message_from(&body),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| VaultError::RequestError(e.to_string()))?;

    if body.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&body)
        .map(Some)
        .map_err(|e| VaultError::RequestError(format!("Invalid response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_builder_defaults() {
        let builder = VaultClientBuilder::new();
        assert!(builder.base_url.is_none());
        assert!(builder.application_name.is_none());
        assert_eq!(builder.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let client = VaultClient::builder()
            .base_url("http://vault:8200/")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://vault:8200");
        assert_eq!(
            client.endpoint("/auth/token/renew-self"),
            "http://vault:8200/v1/auth/token/renew-self"
        );
        assert_eq!(
            client.endpoint("cubbyhole/response"),
            "http://vault:8200/v1/cubbyhole/response"
        );
    }

    #[tokio::test]
    async fn test_get_sends_bearer_token() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/cubbyhole/token"))
            .and(header("authorization", "Bearer initial"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"data": {"token": "abc"}})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = VaultClient::new(mock_server.uri());
        let resp = client
            .get("cubbyhole/token", Some(&Token::new("initial")))
            .await
            .unwrap();

        let data = resp.data.unwrap();
        assert_eq!(data.get("token").unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_error_status_maps_to_client_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/token/renew-self"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(serde_json::json!({"errors": ["permission denied"]})),
            )
            .mount(&mock_server)
            .await;

        let client = VaultClient::new(mock_server.uri());
        let result = client
            .post("auth/token/renew-self", Some(&Token::new("t")), &serde_json::json!({}))
            .await;

        match result {
            Err(VaultError::ClientError { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "permission denied");
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_post_without_body_returns_none() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/token/revoke-self"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let client = VaultClient::new(mock_server.uri());
        let resp = client
            .post("auth/token/revoke-self", Some(&Token::new("t")), &serde_json::json!({}))
            .await
            .unwrap();
        assert!(resp.is_none());
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/auth/token/renew-self"))
            .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(5)))
            .mount(&mock_server)
            .await;

        let client = VaultClient::with_timeout(mock_server.uri(), Duration::from_millis(100));
        let result = client
            .post("auth/token/renew-self", Some(&Token::new("t")), &serde_json::json!({}))
            .await;

        assert!(matches!(result, Err(VaultError::RequestError(_))));
    }
}
