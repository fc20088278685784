//! vault-session - client-side session management for HashiCorp Vault
//!
//! Obtains a token through a pluggable [`ClientAuthentication`] strategy,
//! caches it, renews it ahead of expiry and revokes it on shutdown.
//!
//! Authentication method is taken from `VAULT_AUTH_METHOD`, or detected:
//! 1. VAULT_TOKEN → static token
//! 2. KUBERNETES_SERVICE_HOST → K8s auth

pub mod auth;
mod client;
mod config;
mod error;
mod models;
pub mod scheduler;
mod session;
mod token;

pub use auth::ClientAuthentication;
pub use client::{VaultClient, VaultClientBuilder};
pub use config::{AuthenticationMethod, VaultSessionBuilder};
pub use error::VaultError;
pub use models::{AuthData, VaultResponse, WrapInfo};
pub use session::{LifecycleAwareSessionManager, SessionManager, SessionManagerConfig};
pub use token::{LoginToken, Token, VaultToken};
