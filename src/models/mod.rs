//! Domain types shared across the Counsel client.
//!
//! Everything here is a plain serde-deserializable record; the API speaks
//! snake_case JSON throughout.

pub mod conversation;
pub mod user;

pub use conversation::{Exchange, Message, MessageRole, Output};
pub use user::{User, UserRole};
