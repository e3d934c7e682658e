//! HTTP client for the Shopify Storefront GraphQL cart API.

mod cart_api;
mod origin;

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use tiercart_core::AppConfig;

use crate::error::GatewayError;
use crate::types::{GraphqlRequest, GraphqlResponse};

pub use origin::extract_store_origin;

pub(super) const TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

/// Storefront API client implementing [`crate::CartGateway`].
///
/// Maps 429 to [`GatewayError::RateLimited`], 404 on a known cart to
/// [`GatewayError::NotFound`], and any other non-2xx response to
/// [`GatewayError::UnexpectedStatus`]. Nothing is retried.
pub struct StorefrontClient {
    pub(super) client: Client,
    pub(super) endpoint: Url,
    pub(super) token: String,
}

impl StorefrontClient {
    /// Creates a client for `store_url` with a configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidStoreUrl`] if the store URL or API version
    ///   cannot form a valid endpoint.
    /// - [`GatewayError::Http`] if the underlying `reqwest::Client` cannot be
    ///   constructed.
    pub fn new(
        store_url: &str,
        storefront_token: &str,
        api_version: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, GatewayError> {
        let endpoint = origin::graphql_endpoint(store_url, api_version)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            endpoint,
            token: storefront_token.to_owned(),
        })
    }

    /// Builds a client from the application configuration.
    ///
    /// # Errors
    ///
    /// See [`StorefrontClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, GatewayError> {
        Self::new(
            &config.store_url,
            &config.storefront_token,
            &config.storefront_api_version,
            config.request_timeout_secs,
            &config.user_agent,
        )
    }

    /// The GraphQL endpoint every request is posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Posts one GraphQL document and decodes its `data` member.
    ///
    /// `cart_id` is the cart the operation targets, if any; an HTTP 404 is
    /// only reported as [`GatewayError::NotFound`] when one is known.
    async fn execute<V, T>(
        &self,
        operation: &'static str,
        query: &str,
        variables: V,
        cart_id: Option<&str>,
    ) -> Result<T, GatewayError>
    where
        V: Serialize,
        T: DeserializeOwned,
    {
        let url = self.endpoint.as_str();
        tracing::debug!(operation, cart_id, "storefront request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(TOKEN_HEADER, &self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&GraphqlRequest { query, variables })
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(60);
            tracing::warn!(operation, retry_after_secs, "storefront rate limited");
            return Err(GatewayError::RateLimited { retry_after_secs });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            if let Some(cart_id) = cart_id {
                return Err(GatewayError::NotFound {
                    cart_id: cart_id.to_owned(),
                });
            }
        }

        if !status.is_success() {
            tracing::warn!(operation, status = status.as_u16(), "storefront returned error status");
            return Err(GatewayError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response.text().await?;
        let parsed = serde_json::from_str::<GraphqlResponse<T>>(&body).map_err(|e| {
            GatewayError::Deserialize {
                context: format!("{operation} response"),
                source: e,
            }
        })?;

        if !parsed.errors.is_empty() {
            let messages = parsed
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            tracing::warn!(operation, %messages, "storefront returned GraphQL errors");
            return Err(GatewayError::Graphql {
                operation,
                messages,
            });
        }

        parsed.data.ok_or_else(|| GatewayError::Graphql {
            operation,
            messages: "response carried no data".to_owned(),
        })
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
