//! HTTP client for the marketplace REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    api::{
        ChatApi, CouponRequest, CouponValidation, CouponValidator, OrdersApi, SlotProvider,
        SlotQuery, TimeSlot, envelope,
    },
    chat::models::{Conversation, ConversationId, ServerMessage},
    checkout::order::{OrderRequest, PlacedOrder},
    config::ApiConfig,
};

use super::ApiError;

/// Authenticated JSON client implementing every REST collaborator trait.
#[derive(Debug, Clone)]
pub struct HttpApi {
    base_url: String,
    token: Option<String>,
    http: Client,
}

impl HttpApi {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            http,
        })
    }

    /// The bearer token attached to requests, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        let builder = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        debug!(%status, bytes = body.len(), "api response");

        envelope::decode(status, &body)
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        debug!(%status, bytes = body.len(), "api response");

        envelope::decode_empty(status, &body)
    }
}

#[async_trait]
impl CouponValidator for HttpApi {
    #[tracing::instrument(
        name = "api.validate_coupon",
        skip(self, request),
        fields(code = %request.code, subtotal = %request.subtotal),
        err
    )]
    async fn validate_coupon(
        &self,
        request: &CouponRequest,
    ) -> Result<CouponValidation, ApiError> {
        self.fetch(
            self.request(Method::POST, "/customer/orders/validate-coupon")
                .json(request),
        )
        .await
    }
}

#[async_trait]
impl SlotProvider for HttpApi {
    #[tracing::instrument(
        name = "api.available_slots",
        skip(self, query),
        fields(vendor = %query.vendor, date = %query.date),
        err
    )]
    async fn available_slots(&self, query: &SlotQuery) -> Result<Vec<TimeSlot>, ApiError> {
        let path = format!("/customer/vendors/{}/available-time-slots", query.vendor);

        self.fetch(self.request(Method::GET, &path).query(&[
            ("date", query.date.to_string()),
            ("service_duration", query.service_duration.get().to_string()),
        ]))
        .await
    }
}

#[async_trait]
impl OrdersApi for HttpApi {
    #[tracing::instrument(
        name = "api.place_order",
        skip(self, order),
        fields(vendor = %order.vendor_id),
        err
    )]
    async fn place_order(&self, order: &OrderRequest) -> Result<PlacedOrder, ApiError> {
        self.fetch(self.request(Method::POST, "/customer/orders").json(order))
            .await
    }
}

#[derive(Debug, Deserialize)]
struct UnreadCount {
    #[serde(alias = "count")]
    unread_count: u32,
}

#[async_trait]
impl ChatApi for HttpApi {
    #[tracing::instrument(name = "api.conversations", skip(self), err)]
    async fn conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.fetch(self.request(Method::GET, "/chat/conversations"))
            .await
    }

    #[tracing::instrument(name = "api.conversation", skip(self), fields(conversation = %id), err)]
    async fn conversation(&self, id: ConversationId) -> Result<Conversation, ApiError> {
        self.fetch(self.request(Method::GET, &format!("/chat/conversations/{id}")))
            .await
    }

    #[tracing::instrument(
        name = "api.send_message",
        skip(self, message),
        fields(conversation = %id),
        err
    )]
    async fn send_message(
        &self,
        id: ConversationId,
        message: &str,
    ) -> Result<ServerMessage, ApiError> {
        let body = serde_json::json!({ "message": message });

        self.fetch(
            self.request(Method::POST, &format!("/chat/conversations/{id}/messages"))
                .json(&body),
        )
        .await
    }

    #[tracing::instrument(name = "api.mark_read", skip(self), fields(conversation = %id), err)]
    async fn mark_read(&self, id: ConversationId) -> Result<(), ApiError> {
        self.execute(self.request(Method::POST, &format!("/chat/conversations/{id}/mark-read")))
            .await
    }

    #[tracing::instrument(name = "api.unread_count", skip(self), err)]
    async fn unread_count(&self) -> Result<u32, ApiError> {
        let count: UnreadCount = self
            .fetch(self.request(Method::GET, "/chat/unread-count"))
            .await?;

        Ok(count.unread_count)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn config(base_url: &str, token: Option<&str>) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            token: token.map(str::to_string),
            timeout_seconds: 5,
        }
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() -> TestResult {
        let api = HttpApi::new(&config("https://api.example.test/api/", None))?;

        let request = api
            .request(Method::GET, "/chat/conversations")
            .build()?;

        assert_eq!(
            request.url().as_str(),
            "https://api.example.test/api/chat/conversations"
        );

        Ok(())
    }

    #[test]
    fn bearer_token_is_attached_when_configured() -> TestResult {
        let api = HttpApi::new(&config("https://api.example.test", Some("secret")))?;

        let request = api.request(Method::GET, "/chat/unread-count").build()?;

        assert_eq!(
            request
                .headers()
                .get(reqwest::header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok()),
            Some("Bearer secret")
        );
        assert_eq!(api.token(), Some("secret"));

        Ok(())
    }

    #[test]
    fn no_authorization_header_without_token() -> TestResult {
        let api = HttpApi::new(&config("https://api.example.test", None))?;

        let request = api.request(Method::GET, "/chat/unread-count").build()?;

        assert!(
            request
                .headers()
                .get(reqwest::header::AUTHORIZATION)
                .is_none(),
            "unexpected authorization header"
        );

        Ok(())
    }

    #[test]
    fn unread_count_accepts_either_key() -> TestResult {
        let short: UnreadCount = serde_json::from_str(r#"{"count": 3}"#)?;
        let long: UnreadCount = serde_json::from_str(r#"{"unread_count": 4}"#)?;

        assert_eq!(short.unread_count, 3);
        assert_eq!(long.unread_count, 4);

        Ok(())
    }
}
