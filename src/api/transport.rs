//! Authenticated request transport for the Counsel API.
//!
//! Every authorized request goes through `AuthenticatedTransport`, which
//! attaches the current access credential and recovers from authorization
//! failures by refreshing the credential and retrying the request exactly
//! once. Refreshing is single-flight: concurrent failures caused by the same
//! invalidation share one refresh call and one outcome.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::{header, Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::auth::{Credential, CredentialStore};

use super::ApiError;

/// Refresh endpoint path; the refresh secret travels in the cookie jar, so
/// the request carries no body and no credential header.
const REFRESH_PATH: &str = "/auth/refresh";

/// Maximum number of retries for rate-limited (429) requests.
/// 3 retries with exponential backoff usually succeeds without excessive delay.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    token_type: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    pub(crate) fn into_credential(self) -> Credential {
        let expires_at = self
            .expires_in
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs));
        Credential::new(self.access_token, expires_at)
    }
}

/// Outcome of a refresh attempt against the session's refresh endpoint.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// A new credential was minted and stored.
    Refreshed(Credential),
    /// The server reports no active session for this client. Not an error:
    /// an anonymous visitor simply has no refresh secret.
    NoSession,
}

/// Wraps outbound requests needing authorization.
/// Clone is cheap - the underlying client and credential slot are shared.
#[derive(Clone)]
pub struct AuthenticatedTransport {
    http: Client,
    base_url: Arc<String>,
    credentials: CredentialStore,
    /// Single-flight gate: at most one network refresh call at a time.
    refresh_gate: Arc<Mutex<()>>,
}

impl AuthenticatedTransport {
    pub(crate) fn new(http: Client, base_url: Arc<String>, credentials: CredentialStore) -> Self {
        Self {
            http,
            base_url,
            credentials,
            refresh_gate: Arc::new(Mutex::new(())),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(Method::GET, path, None::<&()>).await?;
        Self::decode(response).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.execute(Method::POST, path, Some(body)).await?;
        Self::decode(response).await
    }

    /// POST for endpoints that answer with an empty success body.
    pub async fn post_no_content(&self, path: &str) -> Result<(), ApiError> {
        let response = self.execute(Method::POST, path, None::<&()>).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Refresh the access credential using the refresh secret cookie.
    ///
    /// Used directly by session initialization (silent sign-in) and
    /// internally on authorization failures; both paths share the same
    /// single-flight gate. The store is updated before this returns: a new
    /// credential on success, cleared on any failure or on `NoSession`.
    pub async fn refresh_session(&self) -> Result<RefreshOutcome, ApiError> {
        let _gate = self.refresh_gate.lock().await;
        self.run_refresh().await
    }

    /// Dispatch with the current credential; on 401, refresh and retry the
    /// request exactly once with the new credential.
    async fn execute<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, ApiError> {
        let url = self.url(path);
        let (credential, generation) = self.credentials.snapshot();
        let response = self
            .dispatch(method.clone(), &url, body, credential.as_ref())
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(url = %url, "request rejected as unauthorized, recovering credential");
        let fresh = self.recover_credential(generation).await?;
        self.dispatch(method, &url, body, Some(&fresh)).await
    }

    /// Resolve an authorization failure observed at `seen_generation`.
    ///
    /// All concurrent failures from the same invalidation funnel through the
    /// gate; whichever arrives first performs the network refresh, and the
    /// rest adopt its outcome via the credential generation check.
    async fn recover_credential(&self, seen_generation: u64) -> Result<Credential, ApiError> {
        let _gate = self.refresh_gate.lock().await;

        let (current, generation) = self.credentials.snapshot();
        if generation != seen_generation {
            // The invalidation was already resolved while we waited on the
            // gate: either a fresh credential or a cleared store.
            return current.ok_or(ApiError::Unauthorized);
        }

        match self.run_refresh().await {
            Ok(RefreshOutcome::Refreshed(credential)) => Ok(credential),
            Ok(RefreshOutcome::NoSession) => Err(ApiError::Unauthorized),
            Err(e) => {
                warn!(error = %e, "credential refresh failed");
                // The caller sees the original authorization failure; the
                // refresh error itself is only logged.
                Err(ApiError::Unauthorized)
            }
        }
    }

    /// One network refresh call. Callers must hold the refresh gate.
    async fn run_refresh(&self) -> Result<RefreshOutcome, ApiError> {
        let url = self.url(REFRESH_PATH);
        debug!("refreshing access credential");

        let response = match self.http.post(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                self.credentials.clear();
                return Err(ApiError::Network(e));
            }
        };

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("refresh endpoint reports no active session");
            self.credentials.clear();
            return Ok(RefreshOutcome::NoSession);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            self.credentials.clear();
            return Err(ApiError::from_status(status, &body));
        }

        let token: TokenResponse = match response.json().await {
            Ok(token) => token,
            Err(e) => {
                self.credentials.clear();
                return Err(ApiError::InvalidResponse(format!(
                    "failed to parse token response: {e}"
                )));
            }
        };

        debug!(token_type = %token.token_type, "access credential refreshed");
        let credential = token.into_credential();
        self.credentials.set(Some(credential.clone()));
        Ok(RefreshOutcome::Refreshed(credential))
    }

    async fn dispatch<B: Serialize>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        credential: Option<&Credential>,
    ) -> Result<Response, ApiError> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let mut request = self
                .http
                .request(method.clone(), url)
                .headers(Self::auth_headers(credential)?);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                retries += 1;
                if retries > MAX_RATE_LIMIT_RETRIES {
                    return Err(ApiError::RateLimited);
                }
                warn!(url = %url, retry = retries, backoff_ms, "rate limited, backing off");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2;
                continue;
            }

            return Ok(response);
        }
    }

    fn auth_headers(credential: Option<&Credential>) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(credential) = credential {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", credential.token()))
                .map_err(|_| {
                    ApiError::InvalidResponse("credential is not a valid header value".to_string())
                })?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| ApiError::InvalidResponse(format!("failed to parse response: {e}")))
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
