//! Request and response bodies of the token endpoints

use serde::{Deserialize, Serialize};

/// Body of a refresh request
#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Body of a successful refresh response
#[derive(Deserialize)]
pub struct AccessTokenResponse {
    pub access: String,
}
