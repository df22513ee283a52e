use super::AuthSession;
use crate::client::error::ClientError;
use tollgate_core::{RefreshFailurePolicy, TokenKey, is_expired};
use tracing::{debug, warn};

impl AuthSession {
    /// Silently obtain a new access token from the stored refresh token
    ///
    /// Returns `None` without touching the network when no refresh token is
    /// stored, and `None` on any failure.
    pub async fn refresh_access_token(&self) -> Option<String> {
        match self.try_refresh_access_token().await {
            Ok(token) => Some(token),
            Err(ClientError::NotAuthenticated) => None,
            Err(e) => {
                warn!("Token refresh error: {e}");
                None
            }
        }
    }

    /// Refresh and offer the new token to the in-memory state
    ///
    /// The held token is replaced only when it is absent or expired.
    pub async fn try_refresh_access_token(&self) -> Result<String, ClientError> {
        let token = self.refresh_stored_token().await?;

        self.state.send_if_modified(|state| {
            if is_expired(state.access_token.as_deref()) {
                state.access_token = Some(token.clone());
                true
            } else {
                false
            }
        });

        Ok(token)
    }

    /// Exchange the stored refresh token and persist the new access token
    ///
    /// The refresh token itself is never rotated here.
    pub(super) async fn refresh_stored_token(&self) -> Result<String, ClientError> {
        let Some(refresh) = self.store.get(TokenKey::Refresh)? else {
            debug!("No refresh token stored");
            return Err(ClientError::NotAuthenticated);
        };

        match self.client.refresh_access(&refresh).await {
            Ok(access) => {
                self.store.set(TokenKey::Access, &access)?;
                debug!("Access token refreshed");
                Ok(access)
            }
            Err(e) => {
                if e.is_rejection() && self.refresh_failure == RefreshFailurePolicy::ClearTokens {
                    self.clear_rejected_refresh(&refresh);
                }
                Err(e)
            }
        }
    }

    fn clear_rejected_refresh(&self, rejected: &str) {
        // A login may have stored a new pair while the refresh was in flight
        match self.store.get(TokenKey::Refresh) {
            Ok(Some(current)) if current == rejected => {
                warn!("Refresh token rejected, clearing stored tokens");
                self.logout();
            }
            Ok(_) => debug!("Refresh token replaced during refresh, keeping session"),
            Err(e) => warn!("Failed to read stored refresh token: {e}"),
        }
    }
}
