use pharmacart_cart::PricingError;
use pharmacart_core::{OrderStatus, ProductId};
use pharmacart_orders::OrdersError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Problems found in the checkout input before anything is sent.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("required field missing: {0}")]
    MissingField(&'static str),

    #[error("product {product_id} has an invalid price: {price:?}")]
    InvalidPrice { product_id: ProductId, price: String },

    #[error("discount must not be negative, got {0}")]
    NegativeDiscount(Decimal),

    #[error("order amount is too large")]
    AmountOverflow,
}

impl From<PricingError> for ValidationError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::InvalidPrice { product_id, price } => {
                ValidationError::InvalidPrice { product_id, price }
            }
            PricingError::NegativeDiscount(d) => ValidationError::NegativeDiscount(d),
            PricingError::Overflow => ValidationError::AmountOverflow,
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("checkout validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The order could not be placed. The cart is left as it was.
    #[error("order creation failed: {message}")]
    OrderCreationFailed { message: String },

    /// The server refused a status change from the order's current state.
    #[error("order {order_id} cannot move to {requested}: {message}")]
    TransitionRejected {
        order_id: u64,
        requested: OrderStatus,
        message: String,
    },

    #[error("an order submission is already in progress")]
    SubmissionInProgress,

    /// A read against the order service failed.
    #[error(transparent)]
    Orders(#[from] OrdersError),
}

impl From<PricingError> for CheckoutError {
    fn from(err: PricingError) -> Self {
        CheckoutError::Validation(err.into())
    }
}
