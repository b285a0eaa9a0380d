//! The one-shot order confirmation handed from checkout to the success view.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use pharmacart_cart::storage::{self, KeyValueStore};
use pharmacart_cart::{PricingBreakdown, StorageError};
use pharmacart_core::{CartLineItem, PaymentMethod, ProductId};
use pharmacart_orders::OrderResponse;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::draft::PaymentInfo;

pub const LAST_ORDER_KEY: &str = "lastOrder";

/// Days between placing an order and its estimated delivery.
const DELIVERY_ESTIMATE_DAYS: i64 = 2;

/// Storage key of the payment record kept for `order_id`.
#[must_use]
pub fn payment_key(order_id: u64) -> String {
    format!("order_{order_id}_payment")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationItem {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub manufacturer: String,
    pub requires_prescription: bool,
}

/// What the success view shows after an order is placed.
///
/// Totals are the client's checkout summary; `server_total` is the amount
/// the server recorded and is the one that counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    pub order_id: u64,
    pub order_number: String,
    pub order_date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub delivery_address: Option<String>,
    pub delivery_phone: Option<String>,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub discount: Decimal,
    pub vip_discount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub server_total: Decimal,
    pub estimated_delivery: DateTime<Utc>,
    pub items: Vec<ConfirmationItem>,
}

impl OrderConfirmation {
    /// Assembles the confirmation from the server's answer and the lines that
    /// were submitted.
    ///
    /// Items without a parsable price carry zero; pricing was validated
    /// before submission so this only matters for hand-built inputs.
    #[must_use]
    pub fn new(
        order: &OrderResponse,
        lines: &[CartLineItem],
        breakdown: &PricingBreakdown,
        payment: &PaymentInfo,
        delivery_phone: Option<&str>,
    ) -> Self {
        Self {
            order_id: order.id,
            order_number: order.order_number.clone(),
            order_date: order.order_date,
            payment_method: payment.method,
            delivery_address: order.delivery_address.clone(),
            delivery_phone: delivery_phone.map(str::to_owned),
            subtotal: breakdown.subtotal,
            shipping_fee: breakdown.shipping_fee,
            discount: breakdown.discount,
            vip_discount: breakdown.vip_discount,
            tax: breakdown.tax,
            total: breakdown.total,
            server_total: order.total_amount,
            estimated_delivery: order.order_date + TimeDelta::days(DELIVERY_ESTIMATE_DAYS),
            items: lines
                .iter()
                .map(|l| ConfirmationItem {
                    id: l.product.id,
                    name: l.product.name.clone(),
                    price: l.product.unit_price().unwrap_or_default(),
                    quantity: l.quantity,
                    manufacturer: l.product.manufacturer.clone(),
                    requires_prescription: l.product.requires_prescription,
                })
                .collect(),
        }
    }
}

/// Local records written by a successful checkout.
#[derive(Clone)]
pub struct ConfirmationStore {
    storage: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for ConfirmationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationStore").finish_non_exhaustive()
    }
}

impl ConfirmationStore {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Overwrites any unconsumed confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the record cannot be written.
    pub fn save(&self, confirmation: &OrderConfirmation) -> Result<(), StorageError> {
        storage::write_json(self.storage.as_ref(), LAST_ORDER_KEY, confirmation)
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the record cannot be written.
    pub fn save_payment(&self, order_id: u64, payment: &PaymentInfo) -> Result<(), StorageError> {
        storage::write_json(self.storage.as_ref(), &payment_key(order_id), payment)
    }

    /// Returns the stored confirmation and deletes it. A second call returns
    /// `None`. Corrupt data is deleted and reported as absent.
    #[must_use]
    pub fn take(&self) -> Option<OrderConfirmation> {
        let confirmation = storage::read_json(self.storage.as_ref(), LAST_ORDER_KEY)?;
        storage::discard(self.storage.as_ref(), LAST_ORDER_KEY);
        Some(confirmation)
    }

    /// Reads without consuming.
    #[must_use]
    pub fn peek(&self) -> Option<OrderConfirmation> {
        storage::read_json(self.storage.as_ref(), LAST_ORDER_KEY)
    }

    #[must_use]
    pub fn payment(&self, order_id: u64) -> Option<PaymentInfo> {
        storage::read_json(self.storage.as_ref(), &payment_key(order_id))
    }
}
