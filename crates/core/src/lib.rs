//! Tollgate core types and utilities

pub mod config;
pub mod error;
pub mod state_dir;
pub mod store;
pub mod token;


pub use crate::config::{ClientConfig, EndpointConfig, RefreshFailurePolicy};
pub use error::{CoreError, CoreResult};
pub use state_dir::StateDir;
pub use store::{FileTokenStore, MemoryTokenStore, TokenKey, TokenStore};
pub use token::{Claims, Credentials, TokenError, TokenPair, decode_claims, is_expired, is_expired_at};
