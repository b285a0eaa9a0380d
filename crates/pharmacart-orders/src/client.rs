//! HTTP client for the pharmacy order REST API.
//!
//! Wraps `reqwest` with typed request/response bodies, bearer-token auth,
//! server error message extraction, and retry for idempotent reads. Every
//! non-2xx answer surfaces as [`OrdersError::Rejected`] carrying the server's
//! own message when it sent one.

use std::time::Duration;

use pharmacart_core::{AppConfig, OrderStatus, Product};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::error::{server_message, OrdersError};
use crate::retry::retry_with_backoff;
use crate::types::{
    AvailableTransitions, CalculatedTotal, CreateOrderRequest, CustomerResponse, NewCustomer,
    OrderResponse, TransitionRequest,
};

const USER_AGENT: &str = "pharmacart/0.1";

/// Client for the order REST API.
///
/// Use [`OrdersClient::from_config`] in the binary or
/// [`OrdersClient::with_base_url`] to point at a mock server in tests.
#[derive(Clone)]
pub struct OrdersClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
    /// Retry attempts after the first failure, for `GET`s only.
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for OrdersClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .finish_non_exhaustive()
    }
}

impl OrdersClient {
    /// Builds a client from loaded application config.
    ///
    /// # Errors
    ///
    /// See [`OrdersClient::with_base_url`].
    pub fn from_config(config: &AppConfig) -> Result<Self, OrdersError> {
        let mut client = Self::with_base_url(&config.api_base_url, config.request_timeout_secs)?
            .with_retry(config.max_retries, config.retry_backoff_base_ms);
        if let Some(token) = &config.api_token {
            client = client.with_token(token);
        }
        Ok(client)
    }

    /// Creates a client rooted at `base_url` with no retries and no auth.
    ///
    /// # Errors
    ///
    /// Returns [`OrdersError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`OrdersError::InvalidBaseUrl`] if
    /// `base_url` is not an absolute http(s) URL.
    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, OrdersError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;

        // Exactly one trailing slash so relative joins append to the base path
        // instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim().trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| OrdersError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(OrdersError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        Ok(Self {
            client,
            base_url: parsed,
            token: None,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    #[must_use]
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_owned());
        self
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches the product catalogue.
    ///
    /// # Errors
    ///
    /// - [`OrdersError::Rejected`] on a non-2xx status (5xx retried first).
    /// - [`OrdersError::Http`] on network failure after all retries.
    /// - [`OrdersError::Deserialize`] if the body is not a product list.
    pub async fn list_products(&self) -> Result<Vec<Product>, OrdersError> {
        let url = self.endpoint("products/")?;
        self.get_json(url, "GET /products/").await
    }

    /// Registers a walk-in shopper. Never retried.
    ///
    /// # Errors
    ///
    /// - [`OrdersError::Rejected`] if the server refuses the customer.
    /// - [`OrdersError::Http`] on network failure or timeout.
    /// - [`OrdersError::Deserialize`] if the body lacks an `id`.
    pub async fn create_customer(
        &self,
        customer: &NewCustomer,
    ) -> Result<CustomerResponse, OrdersError> {
        let url = self.endpoint("customers/")?;
        let created: CustomerResponse = self
            .send_json(self.client.post(url).json(customer), "POST /customers/")
            .await?;
        tracing::info!(customer_id = created.id, "walk-in customer registered");
        Ok(created)
    }

    /// Places an order. Never retried.
    ///
    /// # Errors
    ///
    /// - [`OrdersError::Rejected`] if the server refuses the order.
    /// - [`OrdersError::Http`] on network failure or timeout.
    /// - [`OrdersError::Deserialize`] if the body is not an order.
    pub async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<OrderResponse, OrdersError> {
        let url = self.endpoint("orders/")?;
        tracing::debug!(
            order_type = %request.order_type,
            items = request.items.len(),
            branch_id = request.branch_id,
            "submitting order"
        );
        self.send_json(self.client.post(url).json(request), "POST /orders/")
            .await
    }

    /// # Errors
    ///
    /// Same as [`OrdersClient::list_products`].
    pub async fn get_order(&self, order_id: u64) -> Result<OrderResponse, OrdersError> {
        let url = self.endpoint(&format!("orders/{order_id}/"))?;
        self.get_json(url, &format!("GET /orders/{order_id}/"))
            .await
    }

    /// Lists the orders of one customer.
    ///
    /// The server's `customer` filter is not trusted; results are filtered
    /// again here.
    ///
    /// # Errors
    ///
    /// Same as [`OrdersClient::list_products`].
    pub async fn customer_orders(&self, customer_id: u64) -> Result<Vec<OrderResponse>, OrdersError> {
        let mut url = self.endpoint("orders/")?;
        url.query_pairs_mut()
            .append_pair("customer", &customer_id.to_string());
        let orders: Vec<OrderResponse> = self.get_json(url, "GET /orders/?customer").await?;
        Ok(orders
            .into_iter()
            .filter(|o| o.customer == Some(customer_id))
            .collect())
    }

    /// Statuses the server would currently accept for `order_id`.
    ///
    /// # Errors
    ///
    /// Same as [`OrdersClient::list_products`].
    pub async fn available_transitions(
        &self,
        order_id: u64,
    ) -> Result<Vec<OrderStatus>, OrdersError> {
        let url = self.endpoint(&format!("orders/{order_id}/available-transitions/"))?;
        let body: AvailableTransitions = self
            .get_json(url, &format!("GET /orders/{order_id}/available-transitions/"))
            .await?;
        Ok(body.into_vec())
    }

    /// Asks the server to move `order_id` to `new_status`. Never retried.
    ///
    /// # Errors
    ///
    /// - [`OrdersError::Rejected`] with a 4xx status when the transition is
    ///   illegal from the current state.
    /// - [`OrdersError::Http`] on network failure or timeout.
    /// - [`OrdersError::Deserialize`] if the body is not an order.
    pub async fn transition_order(
        &self,
        order_id: u64,
        new_status: OrderStatus,
    ) -> Result<OrderResponse, OrdersError> {
        let url = self.endpoint(&format!("orders/{order_id}/transition/"))?;
        let body = TransitionRequest { new_status };
        self.send_json(
            self.client.post(url).json(&body),
            &format!("POST /orders/{order_id}/transition/"),
        )
        .await
    }

    /// Server-computed total for `order_id`.
    ///
    /// # Errors
    ///
    /// Same as [`OrdersClient::list_products`].
    pub async fn calculate_total(&self, order_id: u64) -> Result<CalculatedTotal, OrdersError> {
        let url = self.endpoint(&format!("orders/{order_id}/calculate-total/"))?;
        self.get_json(url, &format!("GET /orders/{order_id}/calculate-total/"))
            .await
    }

    /// Resolves `path` (no leading slash) against the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, OrdersError> {
        self.base_url
            .join(path)
            .map_err(|e| OrdersError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: format!("cannot join '{path}': {e}"),
            })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// `GET` with retry on transient failures.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        context: &str,
    ) -> Result<T, OrdersError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move { self.send_json(self.client.get(url), context).await }
        })
        .await
    }

    /// Sends once, maps non-2xx to [`OrdersError::Rejected`], and decodes the body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, OrdersError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = server_message(&body)
                .unwrap_or_else(|| format!("order service returned HTTP {}", status.as_u16()));
            tracing::debug!(status = status.as_u16(), context, %message, "request rejected");
            return Err(OrdersError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| OrdersError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
