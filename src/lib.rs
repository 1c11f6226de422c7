//! Counsel core - client-side foundation for the Counsel consultation tool.
//!
//! This crate provides the pieces of the client that have to be correct under
//! concurrency and partial failure:
//! - session lifecycle (volatile credential, single-flight token refresh,
//!   session state machine),
//! - reconstruction of an ordered conversation from a raw, possibly
//!   out-of-order message log.
//!
//! Rendering, navigation, and the guidance-generation API itself live in the
//! consuming application.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod transcript;
