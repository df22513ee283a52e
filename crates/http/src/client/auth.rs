//! Token issuance, refresh and registration endpoints

use super::{ApiClient, ClientError};
use crate::types::{AccessTokenResponse, RefreshRequest};
use reqwest::Method;
use serde_json::Value;
use tollgate_core::{Credentials, TokenPair};

impl ApiClient {
    /// Exchange credentials for an access/refresh pair
    pub async fn obtain_token_pair(
        &self,
        credentials: &Credentials,
    ) -> Result<TokenPair, ClientError> {
        let req = self
            .request(Method::POST, &self.endpoints.token)
            .json(credentials);
        self.execute(req).await
    }

    /// Exchange a refresh token for a new access token
    pub async fn refresh_access(&self, refresh: &str) -> Result<String, ClientError> {
        let req = self
            .request(Method::POST, &self.endpoints.refresh)
            .json(&RefreshRequest { refresh });
        let response: AccessTokenResponse = self.execute(req).await?;
        Ok(response.access)
    }

    /// Create an account; the response body is returned as-is
    pub async fn register(&self, credentials: &Credentials) -> Result<Value, ClientError> {
        let req = self
            .request(Method::POST, &self.endpoints.register)
            .json(credentials);
        self.execute(req).await
    }
}
