//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `Credential` / `CredentialStore`: the volatile, memory-only holder of
//!   the current access credential
//! - `SessionManager`: the session state machine (initialize, login, signup,
//!   logout)
//! - `ScopeToken`: cancellation handle for async session operations
//!
//! Nothing in this module ever writes a secret to a durable medium; the
//! long-lived refresh secret stays in an HttpOnly cookie on the server side.

pub mod credentials;
pub mod scope;
pub mod session;

pub use credentials::{Credential, CredentialStore};
pub use scope::ScopeToken;
pub use session::{SessionManager, SessionState};
