use super::{ClientAuthentication, login_with};
use crate::VaultError;
use crate::client::VaultClient;
use crate::token::VaultToken;
use async_trait::async_trait;
use std::collections::HashMap;

pub const DEFAULT_IDENTITY_DOCUMENT_URI: &str =
    "http://169.254.169.254/latest/dynamic/instance-identity/pkcs7";
const DEFAULT_MOUNT: &str = "aws-ec2";

#[derive(Debug, Clone)]
pub struct AwsEc2AuthenticationOptions {
    pub mount: String,
    pub role: Option<String>,
    pub identity_document_uri: String,
    /// Fixed nonce for reauthentication; a random one is generated per
    /// instance otherwise.
    pub nonce: Option<String>,
}

impl Default for AwsEc2AuthenticationOptions {
    fn default() -> Self {
        Self {
            mount: DEFAULT_MOUNT.to_string(),
            role: None,
            identity_document_uri: DEFAULT_IDENTITY_DOCUMENT_URI.to_string(),
            nonce: None,
        }
    }
}

/// AWS EC2 authentication using the signed instance identity document
pub struct AwsEc2Authentication {
    options: AwsEc2AuthenticationOptions,
    nonce: String,
}

impl AwsEc2Authentication {
    pub fn new(options: AwsEc2AuthenticationOptions) -> Self {
        let nonce = options
            .nonce
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Self { options, nonce }
    }

    /// Login body: the PKCS#7 identity document, the nonce and the optional role
    async fn ec2_login(&self, client: &VaultClient) -> Result<HashMap<&'static str, String>, VaultError> {
        let document = client
            .fetch_text(&self.options.identity_document_uri)
            .await
            .map_err(|e| {
                VaultError::AuthError(format!(
                    "Cannot obtain identity document from {}: {}",
                    self.options.identity_document_uri,
                    e.describe()
                ))
            })?;

        let mut login = HashMap::new();
        login.insert("pkcs7", document.replace(['\r', '\n'], ""));
        login.insert("nonce", self.nonce.clone());
        if let Some(ref role) = self.options.role {
            login.insert("role", role.clone());
        }
        Ok(login)
    }
}

impl Default for AwsEc2Authentication {
    fn default() -> Self {
        Self::new(AwsEc2AuthenticationOptions::default())
    }
}

#[async_trait]
impl ClientAuthentication for AwsEc2Authentication {
    async fn login(&self, client: &VaultClient) -> Result<VaultToken, VaultError> {
        let login = self.ec2_login(client).await?;
        login_with(client, &self.options.mount, &login, "AWS-EC2").await
    }
}
