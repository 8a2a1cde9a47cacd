use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Duration;
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, error, info, warn};

use super::store::lock;
use super::{is_valid, Clock, Credential, CredentialEvent, CredentialStore, LoginResponse, Subscription};
use crate::api::{ApiError, AuthApi};

/// Refresh this many seconds before the access token expires
const TOKEN_REFRESH_BUFFER_SECS: i64 = 300;

type RefreshFlight = Shared<BoxFuture<'static, Result<Credential, ApiError>>>;

struct SessionInner {
    store: Arc<CredentialStore>,
    auth: Arc<dyn AuthApi>,
    clock: Arc<dyn Clock>,
    /// The refresh exchange currently running, tagged with its flight id.
    in_flight: Mutex<Option<(u64, RefreshFlight)>>,
    next_flight: AtomicU64,
}

/// Process-wide session handle. Clones share one store and one refresh slot.
///
/// Validity is never cached: every query reads the store and the clock.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

impl SessionContext {
    pub fn new(store: Arc<CredentialStore>, auth: Arc<dyn AuthApi>, clock: Arc<dyn Clock>) -> Self {
        let (credential, version) = store.snapshot();
        if let Some(c) = credential {
            if !c.is_refresh_valid(clock.now()) {
                debug!("Dropping persisted credential with expired refresh token");
                store.clear_if_version(version);
            }
        }

        Self {
            inner: Arc::new(SessionInner {
                store,
                auth,
                clock,
                in_flight: Mutex::new(None),
                next_flight: AtomicU64::new(0),
            }),
        }
    }

    /// Current access token, or an empty string when logged out.
    pub fn token(&self) -> String {
        self.inner
            .store
            .get()
            .map(|c| c.access_token)
            .unwrap_or_default()
    }

    pub fn is_token_valid(&self) -> bool {
        is_valid(self.inner.store.get().as_ref(), self.inner.clock.now())
    }

    pub fn credential(&self) -> Option<Credential> {
        self.inner.store.get()
    }

    /// Whether a credential exists at all, valid or not.
    pub fn has_credential(&self) -> bool {
        self.inner.store.get().is_some()
    }

    pub fn minutes_until_expiry(&self) -> Option<i64> {
        let now = self.inner.clock.now();
        self.inner
            .store
            .get()
            .filter(|c| c.is_access_valid(now))
            .map(|c| c.minutes_until_expiry(now))
    }

    /// True when the access token is about to expire (or has) and the
    /// refresh token can still renew it.
    pub fn needs_refresh(&self) -> bool {
        let now = self.inner.clock.now();
        self.inner
            .store
            .get()
            .map(|c| {
                c.is_refresh_valid(now)
                    && now + Duration::seconds(TOKEN_REFRESH_BUFFER_SECS) >= c.access_expires_at
            })
            .unwrap_or(false)
    }

    pub fn is_refreshing(&self) -> bool {
        lock(&self.inner.in_flight).is_some()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(CredentialEvent) + Send + Sync + 'static,
    {
        self.inner.store.subscribe(listener)
    }

    /// Turn a backend login response into the stored credential.
    ///
    /// A response missing any field is rejected and the store is untouched.
    pub fn login(&self, response: &LoginResponse) -> Result<(), ApiError> {
        let credential = Credential::from_response(response, self.inner.clock.now())?;
        info!(expires_at = %credential.access_expires_at, "Session started");
        self.inner.store.set(credential);
        Ok(())
    }

    /// Exchange username and password for a credential.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let response = self.inner.auth.login(username, password).await?;
        self.login(&response)
    }

    /// End the session. Redirecting is up to the caller.
    pub fn logout(&self) {
        info!("Session ended");
        self.inner.store.clear();
    }

    /// Exchange the refresh token for a new credential.
    ///
    /// Concurrent callers share one exchange and observe the same outcome.
    pub async fn refresh(&self) -> Result<Credential, ApiError> {
        let flight = {
            let mut slot = lock(&self.inner.in_flight);
            match slot.as_ref() {
                Some((_, flight)) => {
                    debug!("Joining in-flight refresh");
                    flight.clone()
                }
                None => {
                    let id = self.inner.next_flight.fetch_add(1, Ordering::Relaxed);
                    let inner = Arc::clone(&self.inner);
                    let flight = async move {
                        // A panic must not leave a poisoned flight in the slot
                        let result = AssertUnwindSafe(inner.exchange_refresh())
                            .catch_unwind()
                            .await
                            .unwrap_or_else(|_| {
                                error!("Refresh exchange panicked");
                                Err(ApiError::RefreshFailed("refresh exchange panicked".to_string()))
                            });
                        let mut slot = lock(&inner.in_flight);
                        if slot.as_ref().map(|(flight_id, _)| *flight_id) == Some(id) {
                            *slot = None;
                        }
                        result
                    }
                    .boxed()
                    .shared();
                    *slot = Some((id, flight.clone()));
                    flight
                }
            }
        };
        flight.await
    }

    /// Run an authenticated call, refreshing first when the token is stale
    /// and retrying once when the server answers `Unauthorized`.
    pub async fn authorized<T, F, Fut>(&self, op: F) -> Result<T, ApiError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let sent = self.fresh_token().await?;
        match op(sent.clone()).await {
            Err(ApiError::Unauthorized) => {
                warn!("Request unauthorized, refreshing session before a single retry");
                let retry_token = match self.valid_credential() {
                    // Someone else already replaced the token we sent
                    Some(c) if c.access_token != sent => c.access_token,
                    _ => self.refresh().await?.access_token,
                };
                match op(retry_token.clone()).await {
                    Err(ApiError::Unauthorized) => {
                        warn!("Request unauthorized after refresh, ending session");
                        self.logout_if_current(&retry_token);
                        Err(ApiError::Unauthorized)
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    /// Log out only if `token` is still the stored one; a newer login or
    /// refresh that landed meanwhile is kept.
    fn logout_if_current(&self, token: &str) {
        let (current, version) = self.inner.store.snapshot();
        match current {
            Some(c) if c.access_token == token => {
                info!("Session ended");
                self.inner.store.clear_if_version(version);
            }
            Some(_) => info!("Credential replaced during retry, keeping the new session"),
            None => {}
        }
    }

    fn valid_credential(&self) -> Option<Credential> {
        let now = self.inner.clock.now();
        self.inner.store.get().filter(|c| c.is_access_valid(now))
    }

    /// A token that is valid right now; never hands out a stale one.
    async fn fresh_token(&self) -> Result<String, ApiError> {
        if let Some(c) = self.valid_credential() {
            return Ok(c.access_token);
        }
        if !self.has_credential() {
            return Err(ApiError::Unauthorized);
        }
        debug!("Access token expired, refreshing before request");
        Ok(self.refresh().await?.access_token)
    }
}

impl SessionInner {
    async fn exchange_refresh(&self) -> Result<Credential, ApiError> {
        let (current, version) = self.store.snapshot();
        let Some(current) = current else {
            return Err(ApiError::RefreshFailed("no active session".to_string()));
        };

        if !current.is_refresh_valid(self.clock.now()) {
            warn!(expired_at = %current.refresh_expires_at, "Refresh token expired");
            self.store.clear_if_version(version);
            return Err(ApiError::RefreshFailed("refresh token expired".to_string()));
        }

        debug!("Exchanging refresh token");
        let response = match self.auth.refresh(&current.refresh_token).await {
            Ok(response) => response,
            Err(e) if e.is_auth_rejection() => {
                warn!(error = %e, "Refresh token rejected");
                self.store.clear_if_version(version);
                return Err(ApiError::RefreshFailed(format!("refresh token rejected: {}", e)));
            }
            Err(e) => {
                warn!(error = %e, "Refresh request failed");
                return Err(e);
            }
        };

        let credential = match Credential::from_response(&response, self.clock.now()) {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "Refresh returned a malformed credential");
                self.store.clear_if_version(version);
                return Err(e);
            }
        };

        // A login or logout that landed mid-exchange wins over this result
        if !self.store.set_if_version(version, credential.clone()) {
            info!("Session changed during refresh, discarding refreshed credential");
            return Err(ApiError::RefreshFailed("session changed during refresh".to_string()));
        }

        info!(expires_at = %credential.access_expires_at, "Session refreshed");
        Ok(credential)
    }
}
