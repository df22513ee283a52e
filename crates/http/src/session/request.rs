use super::AuthSession;
use crate::client::error::ClientError;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tollgate_core::{TokenKey, is_expired};
use tracing::debug;

impl AuthSession {
    /// Make an authenticated request, collapsing every failure to `None`
    ///
    /// `None` means the caller should behave as if not authenticated or as if
    /// the call failed; no further detail is given. Use
    /// [`AuthSession::try_fetch_data`] when the reason matters.
    pub async fn fetch_data<T: DeserializeOwned>(
        &self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Option<T> {
        match self.try_fetch_data(path, method, body).await {
            Ok(data) => Some(data),
            Err(e) => {
                debug!(kind = ?e.kind(), "API request error: {e}");
                None
            }
        }
    }

    /// Make an authenticated request
    ///
    /// The stored access token is used when it has not expired; otherwise a
    /// silent refresh runs first and the refreshed token is sent instead.
    pub async fn try_fetch_data<T: DeserializeOwned>(
        &self,
        path: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<T, ClientError> {
        let token = match self.store.get(TokenKey::Access)? {
            Some(token) if !is_expired(Some(&token)) => token,
            _ => self.try_refresh_access_token().await?,
        };

        let mut request = self.client.authorized_request(method, path, &token);
        if let Some(body) = body {
            request = request.json(body);
        }

        self.client.execute(request).await
    }
}
