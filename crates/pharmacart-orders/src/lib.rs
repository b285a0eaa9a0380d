//! Typed client for the pharmacy order REST API.

pub mod client;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use client::OrdersClient;
pub use error::OrdersError;
pub use types::{
    CalculatedTotal, CreateOrderRequest, CustomerResponse, NewCustomer, OrderItemRequest,
    OrderItemResponse, OrderResponse,
};
