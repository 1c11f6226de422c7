//! HTTP client module for the Counsel API.
//!
//! This module provides:
//! - `ApiClient`: typed access to the session endpoints (signup, login,
//!   refresh, logout, profile)
//! - `AuthenticatedTransport`: bearer-token attachment with single-flight
//!   refresh-and-retry on authorization failure
//!
//! Access credentials are short-lived bearer tokens; the long-lived refresh
//! secret is an HttpOnly cookie handled entirely by the cookie jar.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{ApiClient, SignupProfile};
pub use error::ApiError;
pub use transport::{AuthenticatedTransport, RefreshOutcome};
