//! HTTP surface of the MSRB EMMA disclosure portal.
//!
//! Provides a cookie-carrying [`Session`] for page and feed requests plus the
//! typed payloads the portal embeds in its pages and serves from its feeds.

mod errors;
mod session;
pub mod types;
pub mod user_agent;
pub use self::errors::Error;
pub use self::session::{Session, DEFAULT_BASE_URL};
