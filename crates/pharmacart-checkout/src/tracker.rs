//! Read side of the server-owned order lifecycle.
//!
//! The client never decides whether a status change is legal. It asks the
//! server what is allowed, requests one change, and reports a refusal as
//! [`CheckoutError::TransitionRejected`] without trying another target.

use pharmacart_cart::PricingBreakdown;
use pharmacart_core::OrderStatus;
use pharmacart_orders::{OrderResponse, OrdersClient, OrdersError};
use rust_decimal::Decimal;

use crate::error::CheckoutError;

/// Client breakdown versus the server's computed total. Display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub order_id: u64,
    pub client_total: Decimal,
    pub server_total: Decimal,
}

impl Reconciliation {
    /// `server_total - client_total`.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.server_total - self.client_total
    }

    #[must_use]
    pub fn matches(&self) -> bool {
        self.difference().is_zero()
    }
}

#[derive(Debug, Clone)]
pub struct OrderTracker {
    client: OrdersClient,
}

impl OrderTracker {
    #[must_use]
    pub fn new(client: OrdersClient) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// [`CheckoutError::Orders`] if the order cannot be fetched.
    pub async fn status(&self, order_id: u64) -> Result<OrderResponse, CheckoutError> {
        Ok(self.client.get_order(order_id).await?)
    }

    /// # Errors
    ///
    /// [`CheckoutError::Orders`] if the orders cannot be fetched.
    pub async fn history(&self, customer_id: u64) -> Result<Vec<OrderResponse>, CheckoutError> {
        Ok(self.client.customer_orders(customer_id).await?)
    }

    /// # Errors
    ///
    /// [`CheckoutError::Orders`] if the list cannot be fetched.
    pub async fn available_transitions(
        &self,
        order_id: u64,
    ) -> Result<Vec<OrderStatus>, CheckoutError> {
        Ok(self.client.available_transitions(order_id).await?)
    }

    /// Asks the server to move `order_id` to `requested`.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::TransitionRejected`] when the server refuses with a
    ///   4xx status.
    /// - [`CheckoutError::Orders`] for any other failure.
    pub async fn request_transition(
        &self,
        order_id: u64,
        requested: OrderStatus,
    ) -> Result<OrderResponse, CheckoutError> {
        match self.client.transition_order(order_id, requested).await {
            Ok(order) => {
                tracing::info!(order_id, status = %order.status, "order status changed");
                Ok(order)
            }
            Err(e) if e.is_client_error() => {
                let message = match &e {
                    OrdersError::Rejected { message, .. } => message.clone(),
                    other => other.to_string(),
                };
                tracing::info!(order_id, %requested, %message, "status change refused");
                Err(CheckoutError::TransitionRejected {
                    order_id,
                    requested,
                    message,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Compares `breakdown.total` with the server's computed total.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::Orders`] if the server total cannot be fetched.
    pub async fn reconcile(
        &self,
        order_id: u64,
        breakdown: &PricingBreakdown,
    ) -> Result<Reconciliation, CheckoutError> {
        let server = self.client.calculate_total(order_id).await?;
        let reconciliation = Reconciliation {
            order_id,
            client_total: breakdown.total,
            server_total: server.total,
        };
        if !reconciliation.matches() {
            tracing::info!(
                order_id,
                client_total = %reconciliation.client_total,
                server_total = %reconciliation.server_total,
                "client and server totals differ"
            );
        }
        Ok(reconciliation)
    }
}
