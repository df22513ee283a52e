//! Tollgate HTTP client and authentication session
//!
//! [`client::ApiClient`] speaks to the token endpoints and builds requests;
//! [`session::AuthSession`] keeps the tokens, refreshes them and guards
//! authenticated calls.

pub mod client;
pub mod session;
pub mod types;

pub use client::ApiClient;
pub use client::error::{ClientError, ErrorKind};
pub use reqwest::Method;
pub use session::{AuthSession, SessionState};
