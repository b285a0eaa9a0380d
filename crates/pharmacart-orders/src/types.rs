//! Request and response bodies of the order REST API.

use chrono::{DateTime, Utc};
use pharmacart_core::{OrderStatus, OrderType, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body of `POST /customers/` for a walk-in shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub phone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerResponse {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /orders/`.
///
/// Carries product ids and quantities only; the server prices every line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOrderRequest {
    pub order_type: OrderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<u64>,
    pub branch_id: u64,
    pub items: Vec<OrderItemRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prescription_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderItemResponse {
    pub id: u64,
    pub product: ProductId,
    #[serde(default)]
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub total_price: Option<Decimal>,
}

/// An order as the server reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderResponse {
    pub id: u64,
    pub order_number: String,
    pub order_type: OrderType,
    pub status: OrderStatus,
    #[serde(default)]
    pub customer: Option<u64>,
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Authoritative total computed by the server.
    pub total_amount: Decimal,
    pub order_date: DateTime<Utc>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub delivery_instructions: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemResponse>,
}

/// Response of `GET /orders/:id/calculate-total/`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CalculatedTotal {
    pub total: Decimal,
    /// Server-side breakdown; its shape depends on the order type.
    #[serde(default)]
    pub breakdown: Option<serde_json::Value>,
}

/// `available-transitions` answers either with a bare list or wrapped in an
/// object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum AvailableTransitions {
    List(Vec<OrderStatus>),
    Wrapped {
        #[serde(default)]
        available_transitions: Vec<OrderStatus>,
    },
}

impl AvailableTransitions {
    pub(crate) fn into_vec(self) -> Vec<OrderStatus> {
        match self {
            AvailableTransitions::List(v) | AvailableTransitions::Wrapped {
                available_transitions: v,
            } => v,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TransitionRequest {
    pub new_status: OrderStatus,
}
