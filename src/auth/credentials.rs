use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

/// The current access credential: an opaque bearer token and the expiry the
/// server declared for it, if any.
///
/// Credentials live in memory for the duration of the process and are never
/// serialized; `Debug` omits the token so it cannot leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// The bearer token value for the Authorization header.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Whether the server-declared expiry has passed. Credentials without a
    /// declared expiry are treated as live until the server rejects them.
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|at| Utc::now() > at).unwrap_or(false)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Default)]
struct Slot {
    credential: Option<Credential>,
    /// Bumped on every write so concurrent authorization failures can tell
    /// whether a refresh already resolved their invalidation.
    generation: u64,
}

/// Volatile holder of the current access credential.
///
/// Cloning shares the same slot. The store performs no validation of
/// credential contents, and every write is a single assignment under the
/// lock, so readers never observe a torn value.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    inner: Arc<Mutex<Slot>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Credential> {
        self.lock().credential.clone()
    }

    pub fn set(&self, credential: Option<Credential>) {
        let mut slot = self.lock();
        slot.credential = credential;
        slot.generation += 1;
    }

    pub fn clear(&self) {
        self.set(None);
    }

    /// Current credential together with the write generation that produced it.
    pub(crate) fn snapshot(&self) -> (Option<Credential>, u64) {
        let slot = self.lock();
        (slot.credential.clone(), slot.generation)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
        // A poisoned lock still holds a coherent slot; recover it.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
