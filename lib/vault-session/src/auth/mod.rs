mod aws_ec2;
mod cert;
mod cubbyhole;
mod cubbyhole_options;
mod kubernetes;
mod token;

pub use aws_ec2::{AwsEc2Authentication, AwsEc2AuthenticationOptions};
pub use cert::ClientCertificateAuthentication;
pub use cubbyhole::CubbyholeAuthentication;
pub use cubbyhole_options::{CubbyholeAuthenticationOptions, CubbyholeAuthenticationOptionsBuilder};
pub use kubernetes::KubernetesAuthentication;
pub use token::TokenAuthentication;

use crate::client::VaultClient;
use crate::models::VaultResponse;
use crate::token::{LoginToken, VaultToken};
use crate::VaultError;
use async_trait::async_trait;

/// Strategy obtaining an initial Vault token
#[async_trait]
pub trait ClientAuthentication: Send + Sync {
    /// Perform the login exchange against Vault
    async fn login(&self, client: &VaultClient) -> Result<VaultToken, VaultError>;
}

/// POST a login request to `auth/<mount>/login` and turn the `auth` block of
/// the response into a [`LoginToken`]. `what` names the method in errors.
pub(crate) async fn login_with<B>(
    client: &VaultClient,
    mount: &str,
    body: &B,
    what: &str,
) -> Result<VaultToken, VaultError>
where
    B: serde::Serialize + ?Sized,
{
    let path = format!("auth/{}/login", mount);

    let response = client
        .post(&path, None, body)
        .await
        .map_err(|e| VaultError::AuthError(format!("Cannot login using {}: {}", what, e.describe())))?;

    let token = login_token_from(response, what)?;
    tracing::debug!(method = what, "Login successful");
    Ok(token)
}

pub(crate) fn login_token_from(
    response: Option<VaultResponse>,
    what: &str,
) -> Result<VaultToken, VaultError> {
    response
        .and_then(|resp| resp.auth)
        .map(|auth| VaultToken::Login(LoginToken::from(auth)))
        .ok_or_else(|| {
            VaultError::AuthError(format!(
                "Cannot login using {}: response does not contain auth data",
                what
            ))
        })
}
