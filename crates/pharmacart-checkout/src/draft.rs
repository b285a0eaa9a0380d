//! Checkout input and the order draft built from it.

use pharmacart_core::{CartLineItem, CustomerTier, OrderType, PaymentMethod};
use pharmacart_orders::{CreateOrderRequest, NewCustomer, OrderItemRequest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::classify::classify_order_type;
use crate::error::ValidationError;

/// Who is buying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerIdentity {
    /// A signed-in customer already known to the server.
    Registered {
        customer_id: u64,
        tier: CustomerTier,
        phone: Option<String>,
    },
    /// A shopper without an account; registered with the server at submission.
    WalkIn {
        name: String,
        phone: String,
        email: Option<String>,
    },
}

/// Everything the shopper enters on the checkout form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerInfo {
    pub identity: CustomerIdentity,
    pub delivery_address: Option<String>,
    pub delivery_instructions: Option<String>,
    pub notes: Option<String>,
    pub prescription_id: Option<u64>,
}

impl CustomerInfo {
    #[must_use]
    pub fn registered(customer_id: u64, tier: CustomerTier) -> Self {
        Self::new(CustomerIdentity::Registered {
            customer_id,
            tier,
            phone: None,
        })
    }

    #[must_use]
    pub fn walk_in(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self::new(CustomerIdentity::WalkIn {
            name: name.into(),
            phone: phone.into(),
            email: None,
        })
    }

    fn new(identity: CustomerIdentity) -> Self {
        Self {
            identity,
            delivery_address: None,
            delivery_instructions: None,
            notes: None,
            prescription_id: None,
        }
    }

    #[must_use]
    pub fn with_delivery_address(mut self, address: impl Into<String>) -> Self {
        self.delivery_address = Some(address.into());
        self
    }

    #[must_use]
    pub fn with_delivery_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.delivery_instructions = Some(instructions.into());
        self
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn with_prescription(mut self, prescription_id: u64) -> Self {
        self.prescription_id = Some(prescription_id);
        self
    }

    /// Sets the phone of a registered customer or the email of a walk-in.
    #[must_use]
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        match &mut self.identity {
            CustomerIdentity::Registered { phone, .. } => *phone = Some(contact.into()),
            CustomerIdentity::WalkIn { email, .. } => *email = Some(contact.into()),
        }
        self
    }

    #[must_use]
    pub fn is_vip(&self) -> bool {
        matches!(
            self.identity,
            CustomerIdentity::Registered { tier, .. } if tier.is_vip()
        )
    }

    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        match &self.identity {
            CustomerIdentity::Registered { phone, .. } => phone.as_deref(),
            CustomerIdentity::WalkIn { phone, .. } => Some(phone.as_str()),
        }
    }

    /// Delivery address with blank input treated as absent.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        non_blank(self.delivery_address.as_deref())
    }
}

/// How the shopper pays. Stored locally under `order_<id>_payment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub amount: Decimal,
}

impl PaymentInfo {
    #[must_use]
    pub fn new(method: PaymentMethod, amount: Decimal) -> Self {
        Self {
            method,
            transaction_id: None,
            amount,
        }
    }

    #[must_use]
    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    /// `Payment: card (TX-1)`, used as order notes when the shopper left none.
    #[must_use]
    pub fn description(&self) -> String {
        match non_blank(self.transaction_id.as_deref()) {
            Some(txn) => format!("Payment: {} ({txn})", self.method),
            None => format!("Payment: {}", self.method),
        }
    }
}

/// A validated order ready to send, minus the server-side customer id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub order_type: OrderType,
    pub customer: CustomerIdentity,
    pub branch_id: u64,
    pub items: Vec<OrderItemRequest>,
    pub delivery_address: Option<String>,
    pub delivery_instructions: Option<String>,
    pub notes: String,
    pub prescription_id: Option<u64>,
}

impl OrderDraft {
    /// Validates the checkout input and builds the draft.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyCart`] when `lines` is empty. Checked first.
    /// - [`ValidationError::MissingField`] when a walk-in shopper's name or
    ///   phone is blank.
    pub fn build(
        lines: &[CartLineItem],
        customer: &CustomerInfo,
        payment: &PaymentInfo,
        branch_id: u64,
    ) -> Result<Self, ValidationError> {
        if lines.is_empty() {
            return Err(ValidationError::EmptyCart);
        }

        let identity = match &customer.identity {
            CustomerIdentity::WalkIn { name, phone, email } => {
                let name =
                    non_blank(Some(name.as_str())).ok_or(ValidationError::MissingField("name"))?;
                let phone = non_blank(Some(phone.as_str()))
                    .ok_or(ValidationError::MissingField("phone"))?;
                CustomerIdentity::WalkIn {
                    name: name.to_owned(),
                    phone: phone.to_owned(),
                    email: non_blank(email.as_deref()).map(str::to_owned),
                }
            }
            registered @ CustomerIdentity::Registered { .. } => registered.clone(),
        };

        let delivery_address = customer.address().map(str::to_owned);
        let notes = non_blank(customer.notes.as_deref())
            .map_or_else(|| payment.description(), str::to_owned);

        Ok(Self {
            order_type: classify_order_type(lines, delivery_address.as_deref()),
            customer: identity,
            branch_id,
            items: lines
                .iter()
                .map(|l| OrderItemRequest {
                    product_id: l.product.id,
                    quantity: l.quantity,
                })
                .collect(),
            delivery_address,
            delivery_instructions: non_blank(customer.delivery_instructions.as_deref())
                .map(str::to_owned),
            notes,
            prescription_id: customer.prescription_id,
        })
    }

    /// The `POST /customers/` body when the buyer is a walk-in shopper.
    #[must_use]
    pub fn walk_in_registration(&self) -> Option<NewCustomer> {
        match &self.customer {
            CustomerIdentity::WalkIn { name, phone, email } => Some(NewCustomer {
                name: name.clone(),
                email: email.clone(),
                phone: phone.clone(),
            }),
            CustomerIdentity::Registered { .. } => None,
        }
    }

    #[must_use]
    pub fn registered_customer_id(&self) -> Option<u64> {
        match self.customer {
            CustomerIdentity::Registered { customer_id, .. } => Some(customer_id),
            CustomerIdentity::WalkIn { .. } => None,
        }
    }

    #[must_use]
    pub fn into_request(self, customer_id: Option<u64>) -> CreateOrderRequest {
        CreateOrderRequest {
            order_type: self.order_type,
            customer_id,
            branch_id: self.branch_id,
            items: self.items,
            delivery_address: self.delivery_address,
            delivery_instructions: self.delivery_instructions,
            notes: Some(self.notes),
            prescription_id: self.prescription_id,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "draft_test.rs"]
mod tests;
