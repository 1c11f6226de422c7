//! API client for the Counsel session endpoints.
//!
//! Login and signup are credential exchanges and go out raw; the profile and
//! logout endpoints require authorization and go through
//! [`AuthenticatedTransport`], which transparently refreshes a rejected
//! credential. The refresh secret itself never appears here: the server keeps
//! it in an HttpOnly cookie that the shared cookie jar replays.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::auth::{Credential, CredentialStore};
use crate::config::Config;
use crate::models::User;

use super::transport::{AuthenticatedTransport, RefreshOutcome, TokenResponse};
use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(flatten)]
    token: TokenResponse,
    user: User,
}

/// New-account details for `POST /auth/signup`.
#[derive(Debug, Clone, Serialize)]
pub struct SignupProfile {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Client for the Counsel API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Arc<String>,
    transport: AuthenticatedTransport,
}

impl ApiClient {
    /// Create a new API client against the given base URL.
    ///
    /// The cookie store holds the refresh secret the server sets on login,
    /// signup, and refresh; it lives and dies with this client.
    pub fn new(base_url: &str, credentials: CredentialStore) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .cookie_store(true)
            .build()?;

        let base_url = Arc::new(base_url.trim_end_matches('/').to_string());
        let transport =
            AuthenticatedTransport::new(http.clone(), Arc::clone(&base_url), credentials);

        Ok(Self {
            http,
            base_url,
            transport,
        })
    }

    pub fn from_config(config: &Config, credentials: CredentialStore) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, credentials)
    }

    pub fn transport(&self) -> &AuthenticatedTransport {
        &self.transport
    }

    /// Exchange email and password for a credential and the signed-in user.
    pub async fn login(&self, email: &str, password: &str) -> Result<(Credential, User), ApiError> {
        let url = self.url("/auth/login");
        let response = self
            .http
            .post(&url)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        Self::auth_exchange(response).await
    }

    /// Create an account; the response is already an authenticated session.
    pub async fn signup(&self, profile: &SignupProfile) -> Result<(Credential, User), ApiError> {
        let url = self.url("/auth/signup");
        let response = self.http.post(&url).json(profile).send().await?;

        Self::auth_exchange(response).await
    }

    /// Silent refresh using the refresh secret cookie.
    pub async fn refresh_session(&self) -> Result<RefreshOutcome, ApiError> {
        self.transport.refresh_session().await
    }

    /// Fetch the current user's profile.
    pub async fn fetch_profile(&self) -> Result<User, ApiError> {
        self.transport.get("/auth/me").await
    }

    /// Revoke the refresh secret server-side.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.transport.post_no_content("/auth/logout").await
    }

    async fn auth_exchange(response: Response) -> Result<(Credential, User), ApiError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_auth_status(status, &body));
        }

        let auth: AuthResponse = response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("failed to parse auth response: {e}"))
        })?;

        debug!(user_id = %auth.user.id, "authentication exchange succeeded");
        Ok((auth.token.into_credential(), auth.user))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
