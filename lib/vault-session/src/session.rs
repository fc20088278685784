use crate::VaultError;
use crate::auth::ClientAuthentication;
use crate::client::VaultClient;
use crate::scheduler::TaskScheduler;
use crate::token::{LoginToken, VaultToken};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;

const DEFAULT_REFRESH_THRESHOLD: f64 = 0.75;
const DEFAULT_MIN_REFRESH_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_LEASE_DURATION: Duration = Duration::from_secs(30);

const RENEW_SELF_PATH: &str = "auth/token/renew-self";
const REVOKE_SELF_PATH: &str = "auth/token/revoke-self";

/// Provides the token for the current Vault session
#[async_trait]
pub trait SessionManager: Send + Sync {
    async fn session_token(&self) -> Result<VaultToken, VaultError>;
}

#[derive(Debug, Clone)]
pub struct SessionManagerConfig {
    /// Fraction of the lease after which the token is renewed
    pub refresh_threshold: f64,
    /// Lower bound of the renewal delay, capped at half the lease
    pub min_refresh_delay: Duration,
    /// Lease assumed for renewable tokens reporting no lease duration.
    /// Zero falls back to 30s.
    pub default_lease_duration: Duration,
}

impl Default for SessionManagerConfig {
    fn default() -> Self {
        Self {
            refresh_threshold: DEFAULT_REFRESH_THRESHOLD,
            min_refresh_delay: DEFAULT_MIN_REFRESH_DELAY,
            default_lease_duration: DEFAULT_LEASE_DURATION,
        }
    }
}

impl SessionManagerConfig {
    /// Delay after which a token with the given lease is renewed.
    /// Always shorter than a non-zero lease.
    pub fn renewal_delay(&self, lease_duration: Duration) -> Duration {
        let lease = match (lease_duration.is_zero(), self.default_lease_duration.is_zero()) {
            (false, _) => lease_duration,
            (true, false) => self.default_lease_duration,
            (true, true) => DEFAULT_LEASE_DURATION,
        };
        let threshold = if self.refresh_threshold > 0.0 && self.refresh_threshold < 1.0 {
            self.refresh_threshold
        } else {
            DEFAULT_REFRESH_THRESHOLD
        };

        lease
            .mul_f64(threshold)
            .max(self.min_refresh_delay.min(lease / 2))
    }
}

#[derive(Debug, Default)]
struct SessionState {
    token: Option<VaultToken>,
    renewal_scheduled: bool,
    destroyed: bool,
}

struct Inner {
    client: VaultClient,
    authentication: Arc<dyn ClientAuthentication>,
    scheduler: Arc<dyn TaskScheduler>,
    config: SessionManagerConfig,
    state: Mutex<SessionState>,
}

/// Session manager that logs in lazily, renews renewable tokens ahead of
/// their expiry and revokes the token on [`destroy`](Self::destroy).
///
/// The session lock is held across the login and renew exchanges so the
/// cached token is never read while it is being replaced. A failed renewal
/// stops the renewal chain and keeps the stale token until the next explicit
/// [`renew_token`](Self::renew_token).
#[derive(Clone)]
pub struct LifecycleAwareSessionManager {
    inner: Arc<Inner>,
}

impl LifecycleAwareSessionManager {
    pub fn new(
        client: VaultClient,
        authentication: Arc<dyn ClientAuthentication>,
        scheduler: Arc<dyn TaskScheduler>,
    ) -> Self {
        Self::with_config(client, authentication, scheduler, SessionManagerConfig::default())
    }

    pub fn with_config(
        client: VaultClient,
        authentication: Arc<dyn ClientAuthentication>,
        scheduler: Arc<dyn TaskScheduler>,
        config: SessionManagerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                authentication,
                scheduler,
                config,
                state: Mutex::new(SessionState::default()),
            }),
        }
    }

    /// Cached token, logging in first when there is none
    pub async fn session_token(&self) -> Result<VaultToken, VaultError> {
        let mut state = self.inner.state.lock().await;
        if state.destroyed {
            return Err(VaultError::SessionDestroyed);
        }
        if let Some(ref token) = state.token {
            return Ok(token.clone());
        }

        self.inner.login(&mut state).await
    }

    /// Log in when no token is cached, otherwise renew a renewable token.
    ///
    /// Login failures are returned as errors. Renewal failures are logged
    /// and reported as `Ok(false)`, in which case no further renewal is
    /// scheduled.
    pub async fn renew_token(&self) -> Result<bool, VaultError> {
        let mut state = self.inner.state.lock().await;
        if state.destroyed {
            return Err(VaultError::SessionDestroyed);
        }
        if state.token.is_none() {
            self.inner.login(&mut state).await?;
            return Ok(true);
        }

        Ok(self.inner.renew(&mut state).await)
    }

    /// Revoke the cached login token. Failures are logged, never returned.
    /// Calling it again is a no-op.
    pub async fn destroy(&self) {
        let mut state = self.inner.state.lock().await;
        state.destroyed = true;

        let Some(token) = state.token.take() else {
            return;
        };

        let VaultToken::Login(login) = token else {
            return;
        };

        match self
            .inner
            .client
            .post(REVOKE_SELF_PATH, Some(login.token()), &serde_json::json!({}))
            .await
        {
            Ok(_) => tracing::info!("Vault session token revoked"),
            Err(e) => tracing::warn!("Cannot revoke Vault session token: {}", e),
        }
    }
}

#[async_trait]
impl SessionManager for LifecycleAwareSessionManager {
    async fn session_token(&self) -> Result<VaultToken, VaultError> {
        LifecycleAwareSessionManager::session_token(self).await
    }
}

impl Inner {
    async fn login(self: &Arc<Self>, state: &mut SessionState) -> Result<VaultToken, VaultError> {
        let token = self.authentication.login(&self.client).await?;
        state.token = Some(token.clone());

        if let VaultToken::Login(ref login) = token {
            self.schedule_renewal(state, login);
        }

        Ok(token)
    }

    /// Renew the cached token; non-renewable tokens are left alone
    async fn renew(self: &Arc<Self>, state: &mut SessionState) -> bool {
        let current = match state.token {
            Some(VaultToken::Login(ref login)) if login.is_renewable() => login.clone(),
            _ => return true,
        };

        let response = match self
            .client
            .post(RENEW_SELF_PATH, Some(current.token()), &serde_json::json!({}))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Cannot renew Vault session token: {}", e);
                return false;
            }
        };

        let renewed = response
            .and_then(|resp| resp.auth)
            .map(LoginToken::from)
            .unwrap_or(current);

        tracing::debug!(
            lease_duration = renewed.lease_duration().as_secs(),
            "Vault session token renewed"
        );

        state.token = Some(VaultToken::Login(renewed.clone()));
        self.schedule_renewal(state, &renewed);
        true
    }

    fn schedule_renewal(self: &Arc<Self>, state: &mut SessionState, token: &LoginToken) {
        if !token.is_renewable() || state.renewal_scheduled {
            return;
        }

        let delay = self.config.renewal_delay(token.lease_duration());
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Scheduling token renewal");

        state.renewal_scheduled = true;
        self.scheduler
            .schedule(delay, renewal_task(Arc::downgrade(self)));
    }

    async fn run_scheduled_renewal(self: &Arc<Self>) {
        let mut state = self.state.lock().await;
        state.renewal_scheduled = false;
        if state.destroyed || state.token.is_none() {
            return;
        }

        self.renew(&mut state).await;
    }
}

fn renewal_task(inner: Weak<Inner>) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        if let Some(inner) = inner.upgrade() {
            inner.run_scheduled_renewal().await;
        }
    })
}
