//! Tollgate HTTP client

pub mod auth;
pub mod error;

use error::ClientError;
use reqwest::{Client, ClientBuilder, header};
use std::time::Duration;
use tollgate_core::{ClientConfig, EndpointConfig};
use url::Url;

/// API client bound to a base URL
///
/// Every request carries `Content-Type: application/json`. Requests built
/// with [`ApiClient::authorized_request`] also carry a bearer token.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    endpoints: EndpointConfig,
}

impl ApiClient {
    /// Create a new client with default configuration
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a client from loaded configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut builder = Self::builder()
            .base_url(&config.base_url)
            .user_agent(&config.user_agent)
            .endpoints(config.endpoints.clone());

        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        builder.build()
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the token endpoint paths
    pub const fn endpoints(&self) -> &EndpointConfig {
        &self.endpoints
    }

    /// Absolute URL for a path relative to the base URL
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Create a request builder without authentication
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header(header::CONTENT_TYPE, "application/json")
    }

    /// Create a request builder carrying `Authorization: Bearer <token>`
    pub fn authorized_request(
        &self,
        method: reqwest::Method,
        path: &str,
        token: &str,
    ) -> reqwest::RequestBuilder {
        self.request(method, path)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
    }

    /// Execute a request and handle common errors
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await?;
            Ok(serde_json::from_slice(&body)?)
        } else {
            let message = response.text().await.unwrap_or_else(|_| status.to_string());
            Err(ClientError::from_status(status, message))
        }
    }
}

/// Builder for ApiClient
#[derive(Default)]
pub struct ApiClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    endpoints: Option<EndpointConfig>,
}

impl ApiClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Override the token endpoint paths
    pub fn endpoints(mut self, endpoints: EndpointConfig) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ApiClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        Url::parse(&base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid base_url {base_url:?}: {e}")))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut client_builder = ClientBuilder::new();

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        if let Some(user_agent) = self.user_agent {
            client_builder = client_builder.user_agent(user_agent);
        } else {
            client_builder =
                client_builder.user_agent(concat!("tollgate-client/", env!("CARGO_PKG_VERSION")));
        }

        let client = client_builder.build()?;

        Ok(ApiClient {
            client,
            base_url,
            endpoints: self.endpoints.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_with_single_slash() {
        let client = ApiClient::new("http://127.0.0.1:8000/").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
        assert_eq!(client.url("api/test"), "http://127.0.0.1:8000/api/test");
        assert_eq!(client.url("/api/test"), "http://127.0.0.1:8000/api/test");
    }

    #[test]
    fn test_builder_requires_base_url() {
        let result = ApiClient::builder().build();
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn test_builder_rejects_relative_base_url() {
        let result = ApiClient::new("api/");
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn test_from_config_carries_endpoints() {
        let config = ClientConfig {
            base_url: "https://api.example.com/v2/".to_string(),
            endpoints: EndpointConfig {
                token: "jwt/create/".to_string(),
                ..EndpointConfig::default()
            },
            ..ClientConfig::default()
        };

        let client = ApiClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "https://api.example.com/v2");
        assert_eq!(client.endpoints().token, "jwt/create/");
        assert_eq!(client.endpoints().refresh, "api/token/refresh/");
    }
}
