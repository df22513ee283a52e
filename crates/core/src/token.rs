//! Token types and local expiry checks
//!
//! Access and refresh tokens are JWTs issued by the remote API. The client
//! never verifies their signature; it only decodes the payload segment to
//! read the `exp` claim. The server stays the authority on validity, so the
//! checks here are advisory and fail towards "expired".

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Username and password submitted for a login or registration
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Access/refresh pair returned by the token issuance endpoint
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair").finish_non_exhaustive()
    }
}

/// Claims read from a token payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Claims {
    /// Expiration time (seconds since the Unix epoch)
    pub exp: f64,
    /// Issued at (seconds since the Unix epoch)
    #[serde(default)]
    pub iat: Option<f64>,
    /// `access` or `refresh` for tokens issued by the remote API
    #[serde(default)]
    pub token_type: Option<String>,
}

impl Claims {
    /// Expiry as a timestamp, if it fits in the representable range
    #[allow(clippy::cast_possible_truncation)]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis((self.exp * 1000.0) as i64)
    }
}

/// The only claim the expiry check reads
#[derive(Deserialize)]
struct Expiry {
    exp: f64,
}

/// Reasons a token payload could not be read
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Malformed token: {0}")]
    Malformed(&'static str),

    #[error("Invalid payload encoding: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid payload JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode the payload segment of a JWT without verifying it
pub fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    decode_payload(token)
}

fn decode_payload<T: DeserializeOwned>(token: &str) -> Result<T, TokenError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next()) {
        (Some(_header), Some(payload)) if !payload.is_empty() => payload,
        _ => return Err(TokenError::Malformed("missing payload segment")),
    };

    // Accept the standard alphabet and padding as well as base64url
    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD.decode(normalized)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Whether `token` should be treated as expired right now
pub fn is_expired(token: Option<&str>) -> bool {
    is_expired_at(token, Utc::now())
}

/// Whether `token` should be treated as expired at `now`
///
/// Only `exp` is read. An absent token, or one whose payload or `exp` cannot
/// be decoded, counts as expired. Otherwise the token is expired iff `exp * 1000` is strictly before `now`
/// in milliseconds.
#[allow(clippy::cast_precision_loss)]
pub fn is_expired_at(token: Option<&str>, now: DateTime<Utc>) -> bool {
    let Some(token) = token else {
        return true;
    };

    match decode_payload::<Expiry>(token) {
        Ok(Expiry { exp }) => exp * 1000.0 < now.timestamp_millis() as f64,
        Err(e) => {
            tracing::debug!("Token decoding error: {e}");
            true
        }
    }
}
