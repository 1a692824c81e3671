use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::client::{ChargerApi, TokenGrant};
use crate::auth::credentials::Credentials;
use crate::auth::store::TokenStore;
use crate::auth::token::TokenPair;
use crate::error::AppError;

/// How often the periodic refresh task re-triggers a token refresh.
pub const TOKEN_REFRESH_PERIOD: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Default)]
struct TokenState {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// Owns the access/refresh token pair for one account and keeps the
/// persisted record consistent with memory.
///
/// All callers share one manager per account and obtain tokens through
/// [`get_access_token`](Self::get_access_token). Tokens are never validated
/// proactively; staleness is discovered when a control request comes back
/// 401 and the caller runs [`refresh_after_unauthorized`](Self::refresh_after_unauthorized).
///
/// Authentication and refresh failures are reported as `Ok(false)` plus a
/// log entry, never as errors. The only error class that propagates is a
/// fault in the storage subsystem itself.
///
/// Every token-state access runs under one async mutex, so concurrent
/// refresh attempts serialize and duplicate refreshes collapse into a
/// single outbound call.
pub struct CredentialManager {
    api: ChargerApi,
    credentials: Credentials,
    store: Arc<dyn TokenStore>,
    state: Mutex<TokenState>,
}

impl CredentialManager {
    pub fn new(api: ChargerApi, credentials: Credentials, store: Arc<dyn TokenStore>) -> Self {
        Self {
            api,
            credentials,
            store,
            state: Mutex::new(TokenState::default()),
        }
    }

    /// Get a usable access token, loading the persisted record (and
    /// authenticating if needed) when none is held in memory.
    pub async fn get_access_token(&self) -> Result<String, AppError> {
        let mut state = self.state.lock().await;
        if state.access_token.is_none() {
            self.load_tokens_locked(&mut state).await?;
        }
        state.access_token.clone().ok_or(AppError::NotAuthenticated)
    }

    /// Load the token pair from storage, falling back to a full login when
    /// the record is missing or malformed. Returns whether a stored pair
    /// was used.
    pub async fn load_tokens(&self) -> Result<bool, AppError> {
        let mut state = self.state.lock().await;
        self.load_tokens_locked(&mut state).await
    }

    async fn load_tokens_locked(&self, state: &mut TokenState) -> Result<bool, AppError> {
        let data = self.store.load().await?;

        let Some(record) = data else {
            warn!("no token record found in storage");
            self.authenticate_locked(state).await?;
            return Ok(false);
        };

        let Some(record) = record.as_object() else {
            error!("token record in storage is not a mapping, re-authenticating");
            self.authenticate_locked(state).await?;
            return Ok(false);
        };

        let access_token = record
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty());
        let Some(access_token) = access_token else {
            warn!("token record has no access token, re-authenticating");
            self.authenticate_locked(state).await?;
            return Ok(false);
        };

        state.access_token = Some(access_token.to_string());
        state.refresh_token = record
            .get("refresh_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string);
        info!("loaded tokens from storage");
        Ok(true)
    }

    /// Perform the OAuth2 password grant and persist the resulting pair.
    pub async fn authenticate(&self) -> Result<bool, AppError> {
        let mut state = self.state.lock().await;
        self.authenticate_locked(&mut state).await
    }

    async fn authenticate_locked(&self, state: &mut TokenState) -> Result<bool, AppError> {
        match self
            .api
            .request_token(TokenGrant::Password(&self.credentials))
            .await
        {
            Ok(response) if response.access_token.is_empty() => {
                error!("token endpoint returned an empty access token");
                Ok(false)
            }
            Ok(response) => {
                self.save_tokens_locked(state, response.access_token, response.refresh_token)
                    .await?;
                info!("authenticated with password grant");
                Ok(true)
            }
            Err(err) => {
                error!(error = %err, "authentication failed");
                Ok(false)
            }
        }
    }

    /// Refresh the access token, falling back to a full login when no
    /// refresh token is held or the refresh grant is rejected. A transport
    /// failure reports `Ok(false)` without the fallback, so a flaky network
    /// never burns a still-valid refresh token.
    pub async fn refresh_access_token(&self) -> Result<bool, AppError> {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state).await
    }

    /// Single-flight refresh entry point for 401 handling. `stale` is the
    /// token the caller's rejected request used: if another caller already
    /// replaced it, no network call is made.
    pub async fn refresh_after_unauthorized(&self, stale: &str) -> Result<bool, AppError> {
        let mut state = self.state.lock().await;
        if let Some(current) = state.access_token.as_deref() {
            if current != stale {
                debug!("token already refreshed by a concurrent caller");
                return Ok(true);
            }
        }
        self.refresh_locked(&mut state).await
    }

    async fn refresh_locked(&self, state: &mut TokenState) -> Result<bool, AppError> {
        let Some(refresh_token) = state.refresh_token.clone() else {
            debug!("no refresh token held, performing full login");
            return self.authenticate_locked(state).await;
        };

        match self
            .api
            .request_token(TokenGrant::Refresh {
                refresh_token: &refresh_token,
                credentials: &self.credentials,
            })
            .await
        {
            Ok(response) if response.access_token.is_empty() => {
                error!("token endpoint returned an empty access token on refresh");
                Ok(false)
            }
            Ok(response) => {
                self.save_tokens_locked(state, response.access_token, response.refresh_token)
                    .await?;
                info!("refreshed access token");
                Ok(true)
            }
            Err(AppError::Auth { message, status }) => {
                warn!(?status, reason = %message, "refresh rejected, falling back to full login");
                self.authenticate_locked(state).await
            }
            Err(err) => {
                error!(error = %err, "transport failure while refreshing token");
                Ok(false)
            }
        }
    }

    /// Update the in-memory pair and atomically overwrite the persisted
    /// record. Storage failures propagate unmasked.
    pub async fn save_tokens(
        &self,
        access_token: String,
        refresh_token: Option<String>,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        self.save_tokens_locked(&mut state, access_token, refresh_token)
            .await
    }

    async fn save_tokens_locked(
        &self,
        state: &mut TokenState,
        access_token: String,
        refresh_token: Option<String>,
    ) -> Result<(), AppError> {
        // A grant response may omit the refresh token; keep the one already
        // held rather than forcing a full login on the next refresh cycle.
        let pair = TokenPair {
            access_token,
            refresh_token: refresh_token.or_else(|| state.refresh_token.clone()),
        };

        let record = serde_json::to_value(&pair)?;
        self.store.save(&record).await?;

        state.access_token = Some(pair.access_token);
        state.refresh_token = pair.refresh_token;
        debug!("saved tokens to storage");
        Ok(())
    }
}

/// Re-trigger a token refresh on a fixed period ([`TOKEN_REFRESH_PERIOD`]
/// in production), independent of any 401-driven refresh. Outcomes are
/// logged, never fatal.
pub fn spawn_periodic_refresh(
    manager: Arc<CredentialManager>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick fires immediately; the schedule starts one period out.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match manager.refresh_access_token().await {
                Ok(true) => debug!("periodic token refresh complete"),
                Ok(false) => warn!("periodic token refresh failed"),
                Err(err) => error!(error = %err, "periodic token refresh hit a storage fault"),
            }
        }
    })
}
