use crate::VaultError;
use crate::auth::{
    AwsEc2Authentication, AwsEc2AuthenticationOptions, ClientAuthentication,
    ClientCertificateAuthentication, CubbyholeAuthentication, CubbyholeAuthenticationOptions,
    KubernetesAuthentication, TokenAuthentication,
};
use crate::client::VaultClient;
use crate::scheduler::{TaskScheduler, TokioTaskScheduler};
use crate::session::{LifecycleAwareSessionManager, SessionManagerConfig};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_ROLE: &str = "app";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticationMethod {
    Token,
    Cubbyhole,
    Kubernetes,
    Cert,
    AwsEc2,
}

impl FromStr for AuthenticationMethod {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "token" => Ok(Self::Token),
            "cubbyhole" => Ok(Self::Cubbyhole),
            "kubernetes" => Ok(Self::Kubernetes),
            "cert" => Ok(Self::Cert),
            "aws-ec2" | "aws_ec2" => Ok(Self::AwsEc2),
            other => Err(VaultError::Configuration(format!(
                "Unknown authentication method: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for AuthenticationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Token => "token",
            Self::Cubbyhole => "cubbyhole",
            Self::Kubernetes => "kubernetes",
            Self::Cert => "cert",
            Self::AwsEc2 => "aws-ec2",
        };
        f.write_str(name)
    }
}

/// Builds a [`LifecycleAwareSessionManager`], falling back to environment
/// variables for anything not set explicitly:
///
/// - `VAULT_ADDR`: Vault base URL (required)
/// - `VAULT_AUTH_METHOD`: `token`, `cubbyhole`, `kubernetes`, `cert` or `aws-ec2`.
///   Detected from `VAULT_TOKEN` / `KUBERNETES_SERVICE_HOST` when unset.
/// - `VAULT_TOKEN`: static token, or the initial token for cubbyhole
/// - `VAULT_CUBBYHOLE_PATH`: cubbyhole path holding the token; wrapped
///   response mode when unset
/// - `VAULT_ROLE`: kubernetes / aws-ec2 role
/// - `VAULT_AUTH_MOUNT`: login mount of the authentication backend
/// - `K8S_JWT_TOKEN_PATH`: service account token file
pub struct VaultSessionBuilder {
    base_url: Option<String>,
    application_name: Option<String>,
    auth_method: Option<AuthenticationMethod>,
    token: Option<String>,
    cubbyhole_path: Option<String>,
    role: Option<String>,
    auth_mount: Option<String>,
    k8s_jwt_path: Option<String>,
    timeout: Duration,
    http_client: Option<reqwest::Client>,
    scheduler: Option<Arc<dyn TaskScheduler>>,
    session_config: SessionManagerConfig,
}

impl Default for VaultSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VaultSessionBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            application_name: None,
            auth_method: None,
            token: None,
            cubbyhole_path: None,
            role: None,
            auth_mount: None,
            k8s_jwt_path: None,
            timeout: DEFAULT_TIMEOUT,
            http_client: None,
            scheduler: None,
            session_config: SessionManagerConfig::default(),
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    pub fn auth_method(mut self, method: AuthenticationMethod) -> Self {
        self.auth_method = Some(method);
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn cubbyhole_path(mut self, path: impl Into<String>) -> Self {
        self.cubbyhole_path = Some(path.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn auth_mount(mut self, mount: impl Into<String>) -> Self {
        self.auth_mount = Some(mount.into());
        self
    }

    pub fn k8s_jwt_path(mut self, path: impl Into<String>) -> Self {
        self.k8s_jwt_path = Some(path.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// HTTP client used for all requests, e.g. one with a TLS client identity
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http_client = Some(http);
        self
    }

    pub fn scheduler(mut self, scheduler: Arc<dyn TaskScheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn session_config(mut self, config: SessionManagerConfig) -> Self {
        self.session_config = config;
        self
    }

    fn resolve_config<F>(&self, env: F) -> Result<ResolvedConfig, VaultError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = self
            .base_url
            .clone()
            .or_else(|| env("VAULT_ADDR"))
            .ok_or(VaultError::VaultNotDetected)?;

        let token = self.token.clone().or_else(|| env("VAULT_TOKEN"));

        let auth_method = match self.auth_method {
            Some(method) => method,
            None => match env("VAULT_AUTH_METHOD") {
                Some(name) => name.parse()?,
                None if token.is_some() => AuthenticationMethod::Token,
                None if env("KUBERNETES_SERVICE_HOST").is_some() => AuthenticationMethod::Kubernetes,
                None => {
                    return Err(VaultError::Configuration(
                        "No authentication method configured".to_string(),
                    ));
                }
            },
        };

        Ok(ResolvedConfig {
            base_url,
            auth_method,
            token,
            cubbyhole_path: self
                .cubbyhole_path
                .clone()
                .or_else(|| env("VAULT_CUBBYHOLE_PATH")),
            role: self
                .role
                .clone()
                .or_else(|| env("VAULT_ROLE"))
                .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            auth_mount: self.auth_mount.clone().or_else(|| env("VAULT_AUTH_MOUNT")),
            k8s_jwt_path: self.k8s_jwt_path.clone().or_else(|| env("K8S_JWT_TOKEN_PATH")),
        })
    }

    pub fn build(self) -> Result<LifecycleAwareSessionManager, VaultError> {
        let config = self.resolve_config(|name| std::env::var(name).ok())?;
        let authentication = config.authentication()?;

        let mut client = VaultClient::builder()
            .base_url(config.base_url.clone())
            .timeout(self.timeout);
        if let Some(app_name) = self.application_name {
            client = client.application_name(app_name);
        }
        if let Some(http) = self.http_client {
            client = client.http_client(http);
        }
        let client = client.build()?;

        let scheduler: Arc<dyn TaskScheduler> = match self.scheduler {
            Some(scheduler) => scheduler,
            None => {
                let handle = tokio::runtime::Handle::try_current().map_err(|e| {
                    VaultError::Configuration(format!("No tokio runtime for renewals: {}", e))
                })?;
                Arc::new(TokioTaskScheduler::with_handle(handle))
            }
        };

        tracing::debug!(
            vault_addr = %config.base_url,
            auth_method = %config.auth_method,
            "Vault session configured"
        );

        Ok(LifecycleAwareSessionManager::with_config(
            client,
            authentication,
            scheduler,
            self.session_config,
        ))
    }
}

#[derive(Debug)]
struct ResolvedConfig {
    base_url: String,
    auth_method: AuthenticationMethod,
    token: Option<String>,
    cubbyhole_path: Option<String>,
    role: String,
    auth_mount: Option<String>,
    k8s_jwt_path: Option<String>,
}

impl ResolvedConfig {
    fn required_token(&self) -> Result<String, VaultError> {
        self.token.clone().ok_or_else(|| {
            VaultError::Configuration(format!(
                "VAULT_TOKEN is required for {} authentication",
                self.auth_method
            ))
        })
    }

    fn authentication(&self) -> Result<Arc<dyn ClientAuthentication>, VaultError> {
        let authentication: Arc<dyn ClientAuthentication> = match self.auth_method {
            AuthenticationMethod::Token => Arc::new(TokenAuthentication::new(self.required_token()?)),
            AuthenticationMethod::Cubbyhole => {
                let options = CubbyholeAuthenticationOptions::builder()
                    .initial_token(self.required_token()?);
                let options = match self.cubbyhole_path {
                    Some(ref path) => options.path(path.clone()),
                    None => options.wrapped(),
                };
                Arc::new(CubbyholeAuthentication::new(options.build()?))
            }
            AuthenticationMethod::Kubernetes => {
                let mut auth = KubernetesAuthentication::new(self.role.clone());
                if let Some(ref mount) = self.auth_mount {
                    auth = auth.with_mount(mount.clone());
                }
                if let Some(ref path) = self.k8s_jwt_path {
                    auth = auth.with_jwt_path(path.clone());
                }
                Arc::new(auth)
            }
            AuthenticationMethod::Cert => {
                let mut auth = ClientCertificateAuthentication::new();
                if let Some(ref mount) = self.auth_mount {
                    auth = auth.with_mount(mount.clone());
                }
                Arc::new(auth)
            }
            AuthenticationMethod::AwsEc2 => {
                let mut options = AwsEc2AuthenticationOptions {
                    role: Some(self.role.clone()),
                    ..Default::default()
                };
                if let Some(ref mount) = self.auth_mount {
                    options.mount = mount.clone();
                }
                Arc::new(AwsEc2Authentication::new(options))
            }
        };

        Ok(authentication)
    }
}
