use pharmacart_core::ProductId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while deriving prices from cart lines.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// A product's price text is not a non-negative decimal number.
    #[error("product {product_id} has an invalid price: {price:?}")]
    InvalidPrice { product_id: ProductId, price: String },

    #[error("discount must not be negative, got {0}")]
    NegativeDiscount(Decimal),

    #[error("price arithmetic overflowed")]
    Overflow,
}

/// Errors from the local key/value store.
///
/// These never reach the shopper: the cart logs them and carries on with its
/// in-memory state.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize value for key {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
